//! `json_file`: every record appended to one JSON array document.
//!
//! Each write reads and rewrites the whole file. Fine for tests and small
//! runs; use `json_lines` for anything large.
//!
//! ```toml
//! [[outputs]]
//! method = "json_file"
//! filepath = "out.json"   # or a directory, which gets json_out.json
//! ```

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use stacforge_shared::{MethodOptions, OutputRecord, Result, StacForgeError};

use super::{Output, parse_options};

/// File name used when `filepath` is a directory.
const DIRECTORY_FILE_NAME: &str = "json_out.json";

#[derive(Debug, Deserialize)]
struct Options {
    filepath: PathBuf,
}

#[derive(Debug)]
pub struct JsonFileOutput {
    filepath: PathBuf,
    // Serializes the read-modify-write cycle.
    write_lock: Mutex<()>,
}

impl JsonFileOutput {
    pub const NAME: &'static str = "json_file";

    pub fn new(filepath: impl Into<PathBuf>) -> Self {
        Self {
            filepath: filepath.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn from_options(options: &MethodOptions) -> Result<Self> {
        let options: Options = parse_options(Self::NAME, options)?;
        Ok(Self::new(options.filepath))
    }

    /// The file records are written to.
    pub fn target(&self) -> PathBuf {
        if self.filepath.is_dir() {
            self.filepath.join(DIRECTORY_FILE_NAME)
        } else {
            self.filepath.clone()
        }
    }
}

fn read_existing(path: &Path) -> Result<Vec<Value>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content =
        std::fs::read_to_string(path).map_err(|e| StacForgeError::output_io(path, e))?;
    match serde_json::from_str::<Vec<Value>>(&content) {
        Ok(records) => Ok(records),
        Err(e) => {
            if !content.trim().is_empty() {
                warn!(?path, error = %e, "existing output is not a JSON array, starting a new one");
            }
            Ok(Vec::new())
        }
    }
}

impl Output for JsonFileOutput {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn run(&self, record: &OutputRecord) -> Result<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let path = self.target();

        let mut records = read_existing(&path)?;
        let value =
            serde_json::to_value(record).map_err(|e| StacForgeError::Output(e.to_string()))?;
        records.push(value);

        let content = serde_json::to_string_pretty(&records)
            .map_err(|e| StacForgeError::Output(e.to_string()))?;
        std::fs::write(&path, content).map_err(|e| StacForgeError::output_io(&path, e))?;

        debug!(?path, id = %record.id, total = records.len(), "wrote record to json file");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stacforge_shared::{GeneratorType, Record};

    fn record(id: &str) -> OutputRecord {
        OutputRecord {
            id: id.into(),
            parent_id: None,
            record_type: GeneratorType::Collection,
            uri: format!("/badc/{id}"),
            body: Record::new(),
        }
    }

    fn read(path: &Path) -> Vec<Value> {
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
    }

    #[test]
    fn appends_to_array_across_writes() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = tmp.path().join("out.json");
        let output = JsonFileOutput::new(&path);

        output.run(&record("a")).expect("first");
        output.run(&record("b")).expect("second");

        let written = read(&path);
        assert_eq!(written.len(), 2);
        assert_eq!(written[0]["id"], "a");
        assert_eq!(written[1]["id"], "b");
        assert_eq!(written[1]["type"], "collection");
    }

    #[test]
    fn directory_target_uses_default_name() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let output = JsonFileOutput::new(tmp.path());
        output.run(&record("a")).expect("run");
        assert_eq!(read(&tmp.path().join(DIRECTORY_FILE_NAME)).len(), 1);
    }

    #[test]
    fn non_array_content_is_replaced() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = tmp.path().join("out.json");
        std::fs::write(&path, "{\"not\": \"an array\"}").unwrap();

        JsonFileOutput::new(&path).run(&record("a")).expect("run");
        assert_eq!(read(&path).len(), 1);
    }

    #[test]
    fn unwritable_target_is_an_output_error() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = tmp.path().join("missing").join("out.json");

        let err = JsonFileOutput::new(&path).run(&record("a")).unwrap_err();
        assert!(matches!(err, StacForgeError::Output(_)));
        assert!(err.is_record_scoped());
    }
}
