use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serialport::SerialPort;

/// Something that can emit a sync pulse to the logger and say when it did
pub trait SyncPulse {
    fn pulse(&mut self) -> Result<DateTime<Local>>;
}

/// Sync pulses from toggling DTR on a separate serial port, wired to the
/// logger's software interrupt input
pub struct SerialSynchronizer {
    port: Box<dyn SerialPort>,
}

impl SerialSynchronizer {
    pub fn open(path: &str) -> Result<Self> {
        let port = serialport::new(path, 9600)
            .open()
            .with_context(|| format!("cannot open sync port {}", path))?;
        Ok(SerialSynchronizer { port })
    }
}

impl SyncPulse for SerialSynchronizer {
    fn pulse(&mut self) -> Result<DateTime<Local>> {
        self.port.write_data_terminal_ready(true)?;
        self.port.write_data_terminal_ready(false)?;
        Ok(Local::now())
    }
}
