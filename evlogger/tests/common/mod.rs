use anyhow::Result;
use evlogger::device::Command;
use evlogger::source::SampleSource;
use std::collections::VecDeque;

/// Source that hands out prepared chunks and remembers what was written
#[derive(Default)]
pub struct Scripted {
    pub chunks: VecDeque<String>,
    pub written: Vec<Command>,
    pub flushes: usize,
}

impl Scripted {
    pub fn new(chunks: &[&str]) -> Self {
        Scripted {
            chunks: chunks.iter().map(|c| c.to_string()).collect(),
            ..Default::default()
        }
    }
}

impl SampleSource for Scripted {
    fn flush(&mut self) -> Result<()> {
        self.flushes += 1;
        Ok(())
    }

    fn next_chunk(&mut self) -> Result<Option<String>> {
        Ok(self.chunks.pop_front())
    }

    fn write(&mut self, cmd: Command) -> Result<()> {
        self.written.push(cmd);
        Ok(())
    }

    fn firmware(&mut self) -> Result<Option<String>> {
        Ok(None)
    }
}
