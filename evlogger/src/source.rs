use anyhow::{Context, Result};
use serialport::{ClearBuffer, SerialPort};
use std::io::{Read, Write};
use std::thread;
use std::time::Duration;
use tracing::debug;

use crate::device::{self, Command};

/// Where raw logger text comes from: a serial device or an emulator.
///
/// Reads never block for long: `next_chunk` returns whatever is available,
/// or `None` if nothing is, so the caller's loop can do its housekeeping.
pub trait SampleSource {
    /// Discard anything waiting to be read
    fn flush(&mut self) -> Result<()>;
    /// Text available now, in arbitrary-sized pieces not aligned to lines
    fn next_chunk(&mut self) -> Result<Option<String>>;
    fn write(&mut self, cmd: Command) -> Result<()>;
    /// Firmware identification string, if the device reports one
    fn firmware(&mut self) -> Result<Option<String>>;
}

impl<S: SampleSource + ?Sized> SampleSource for Box<S> {
    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }

    fn next_chunk(&mut self) -> Result<Option<String>> {
        (**self).next_chunk()
    }

    fn write(&mut self, cmd: Command) -> Result<()> {
        (**self).write(cmd)
    }

    fn firmware(&mut self) -> Result<Option<String>> {
        (**self).firmware()
    }
}

/// Logger attached to a serial port
pub struct SerialSource {
    port: Box<dyn SerialPort>,
    /// Text read while waiting for a command reply, handed out by the next read
    pending: String,
}

impl SerialSource {
    pub fn open(path: &str, baud: u32, timeout: Duration) -> Result<Self> {
        let port = serialport::new(path, baud)
            .timeout(timeout)
            .open()
            .with_context(|| format!("cannot open serial port {}", path))?;
        Ok(SerialSource {
            port,
            pending: String::new(),
        })
    }

    fn read_available(&mut self) -> Result<String> {
        let n = self.port.bytes_to_read()? as usize;
        if n == 0 {
            return Ok(String::new());
        }
        let mut buf = vec![0u8; n];
        let n = self.port.read(&mut buf)?;
        buf.truncate(n);
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

impl SampleSource for SerialSource {
    fn flush(&mut self) -> Result<()> {
        self.pending.clear();
        self.port.clear(ClearBuffer::Input)?;
        Ok(())
    }

    fn next_chunk(&mut self) -> Result<Option<String>> {
        let mut chunk = std::mem::take(&mut self.pending);
        chunk.push_str(&self.read_available()?);
        if chunk.is_empty() {
            Ok(None)
        } else {
            Ok(Some(chunk))
        }
    }

    fn write(&mut self, cmd: Command) -> Result<()> {
        debug!("sending {}", cmd);
        self.port.write_all(&cmd.encode())?;
        self.port.flush()?;
        Ok(())
    }

    fn firmware(&mut self) -> Result<Option<String>> {
        let before = self.read_available()?;
        self.pending.push_str(&before);
        self.write(Command::Info)?;
        thread::sleep(Duration::from_millis(50));
        let reply = self.read_available()?;
        let (firmware, rest) = device::split_firmware(&reply);
        self.pending.push_str(&rest);
        Ok(firmware)
    }
}
