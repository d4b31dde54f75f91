//! `json_lines`: buffered bulk sink, one JSON document per line.
//!
//! Records are retained in memory and appended to the file when the buffer
//! reaches `buffer_size` or when the batch finishes.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use serde::Deserialize;
use tracing::debug;

use stacforge_shared::{MethodOptions, OutputRecord, Result, StacForgeError};

use super::{Output, parse_options};

const DEFAULT_BUFFER_SIZE: usize = 1000;

#[derive(Debug, Deserialize)]
struct Options {
    filepath: PathBuf,
    #[serde(default = "default_buffer_size")]
    buffer_size: usize,
}

fn default_buffer_size() -> usize {
    DEFAULT_BUFFER_SIZE
}

#[derive(Debug)]
pub struct JsonLinesOutput {
    filepath: PathBuf,
    buffer_size: usize,
    buffer: Mutex<Vec<String>>,
}

impl JsonLinesOutput {
    pub const NAME: &'static str = "json_lines";

    pub fn new(filepath: impl Into<PathBuf>, buffer_size: usize) -> Self {
        Self {
            filepath: filepath.into(),
            buffer_size: buffer_size.max(1),
            buffer: Mutex::new(Vec::new()),
        }
    }

    pub fn from_options(options: &MethodOptions) -> Result<Self> {
        let options: Options = parse_options(Self::NAME, options)?;
        if options.buffer_size == 0 {
            return Err(StacForgeError::config("json_lines buffer_size must be at least 1"));
        }
        Ok(Self::new(options.filepath, options.buffer_size))
    }

    /// Records currently retained.
    pub fn pending(&self) -> usize {
        self.buffer.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn write_lines(&self, lines: &mut Vec<String>) -> Result<()> {
        if lines.is_empty() {
            return Ok(());
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.filepath)
            .map_err(|e| StacForgeError::output_io(&self.filepath, e))?;

        let mut content = lines.join("\n");
        content.push('\n');
        file.write_all(content.as_bytes())
            .map_err(|e| StacForgeError::output_io(&self.filepath, e))?;

        debug!(path = ?self.filepath, records = lines.len(), "flushed json lines");
        lines.clear();
        Ok(())
    }
}

impl Output for JsonLinesOutput {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn run(&self, record: &OutputRecord) -> Result<()> {
        let line =
            serde_json::to_string(record).map_err(|e| StacForgeError::Output(e.to_string()))?;

        let mut buffer = self.buffer.lock().unwrap_or_else(PoisonError::into_inner);
        buffer.push(line);
        if buffer.len() >= self.buffer_size {
            self.write_lines(&mut buffer)?;
        }
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        let mut buffer = self.buffer.lock().unwrap_or_else(PoisonError::into_inner);
        self.write_lines(&mut buffer)
    }

    fn is_buffered(&self) -> bool {
        true
    }
}
