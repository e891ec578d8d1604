use anyhow::{bail, Result};
use argh::FromArgs;

#[derive(Debug, FromArgs, Clone)]
/// Log click, photodetector and sync events from a hardware event logger
pub struct CliArgs {
    /// print version information
    #[argh(switch, short = 'v')]
    pub version: bool,
    /// generate synthetic events instead of reading a device
    #[argh(switch, short = 'e')]
    pub emulate: bool,
    /// serial port whose DTR line drives the logger's sync input
    #[argh(option, short = 's')]
    pub sync_port: Option<String>,
    /// baud rate of the logger
    #[argh(option, default = "115200")]
    pub baud: u32,
    /// serial read timeout in ms
    #[argh(option, default = "100")]
    pub timeout_ms: u64,
    /// sleep between polls when no data arrived, in ms
    #[argh(option, default = "1")]
    pub tick_ms: u64,
    /// run file path (json)
    #[argh(option, short = 'c')]
    pub config: Option<String>,
    /// base name for output files (log_<date> by default)
    #[argh(option, short = 'o')]
    pub out: Option<String>,
    /// serial port of the logger
    #[argh(positional)]
    pub port: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Device {
    Serial(String),
    Emulated,
}

impl CliArgs {
    /// Which logger to read, checked before anything is opened
    pub fn device(&self) -> Result<Device> {
        match (&self.port, self.emulate) {
            (Some(p), false) => Ok(Device::Serial(p.clone())),
            (None, true) => Ok(Device::Emulated),
            (Some(_), true) => bail!("cannot both emulate and open a serial port"),
            (None, false) => bail!("need to provide a serial port (or --emulate)"),
        }
    }
}

pub mod autoclick;
pub mod device;
pub mod emulator;
pub mod merger;
pub mod run;
pub mod save;
pub mod source;
pub mod sync;
