use argh::FromArgs;
use anyhow::{bail, Context, Result};
use either::{Either, Left, Right};
use std::fs::{self, File};
use std::io::{stdin, stdout, BufReader, BufWriter, Read, Write};

use evtools::{clock, de, ser};

const GIT_VERSION: &str = git_version::git_version!(fallback = "unknown");

#[derive(Debug, FromArgs, Clone)]
/// Align an event log recorded in hardware time to wall-clock time,
/// using the `SW sync` anchors and the `SW` events that follow them.
/// Rows before the first completed sync are written unchanged.
pub struct CliArgs {
    /// print version information
    #[argh(switch, short = 'v')]
    pub version: bool,
    /// event log to read; '-' reads from standard input
    #[argh(positional)]
    pub input: Option<String>,
    /// file to write the synced log to (writes to standard output by default)
    #[argh(option, short = 'o')]
    pub out: Option<String>,
}

fn main() -> Result<()> {
    let args: CliArgs = argh::from_env();
    if args.version {
        let stdout = stdout();
        let mut stdout = stdout.lock();
        writeln!(
            stdout,
            concat!(
                env!("CARGO_BIN_NAME"),
                " ",
                "{}",
            ),
            GIT_VERSION,
        )?;
        return Ok(())
    }

    let input: Either<(), String> = match args.input {
        None => Left(()),
        Some(i) if i == "-" => Left(()),
        Some(i) => match fs::metadata(&i) {
            Ok(m) if m.is_file() => Right(i),
            Ok(_) => bail!("{} is not a file", &i),
            Err(e) => bail!(e),
        },
    };

    let rdr: Box<dyn Read> = match input {
        Left(()) => Box::new(stdin()),
        Right(path) => Box::new(
            File::open(&path).with_context(|| format!("cannot open {}", path))?
        ),
    };
    let mut rdr = de::reader(BufReader::new(rdr));
    let records = de::records(&mut rdr)?;

    let out: Box<dyn Write> = match args.out {
        None => Box::new(stdout()),
        Some(p) => Box::new(BufWriter::new(File::create(p)?)),
    };
    let mut wtr = ser::writer(out);
    ser::header(&mut wtr, &ser::EVENT_HEADER)?;
    ser::records(&mut wtr, &clock::sync_to_wallclock(&records))?;
    wtr.flush()?;
    Ok(())
}
