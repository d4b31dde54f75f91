//! Helpers shared by the generator tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::Value;

use stacforge_describer::CollectionDescriptions;
use stacforge_outputs::Output;
use stacforge_shared::{DEFAULT_CACHE_CAPACITY, OutputRecord, Record, Result};

use crate::generator::GeneratorCore;

pub(crate) const FIXTURE_DESCRIPTIONS: &str = "../../../fixtures/descriptions";

/// A core over the checked-in fixture descriptions.
pub(crate) fn fixture_core() -> GeneratorCore {
    let descriptions =
        CollectionDescriptions::from_root(FIXTURE_DESCRIPTIONS, DEFAULT_CACHE_CAPACITY)
            .expect("fixture descriptions");
    GeneratorCore::new(descriptions)
}

/// Write `(file name, yaml)` pairs to a scratch directory and load them.
pub(crate) fn descriptions_from(
    files: &[(&str, &str)],
) -> (tempfile::TempDir, CollectionDescriptions) {
    let tmp = tempfile::tempdir().expect("tempdir");
    for (name, yaml) in files {
        let path = tmp.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create dirs");
        }
        std::fs::write(path, yaml).expect("write description");
    }
    let descriptions = CollectionDescriptions::from_root(tmp.path(), DEFAULT_CACHE_CAPACITY)
        .expect("load descriptions");
    (tmp, descriptions)
}

pub(crate) fn record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        other => panic!("expected an object, got {other}"),
    }
}

/// Output that keeps every record it receives.
#[derive(Clone, Default)]
pub(crate) struct Capture {
    records: Arc<Mutex<Vec<OutputRecord>>>,
    flushes: Arc<AtomicUsize>,
    buffered: bool,
}

impl Capture {
    pub(crate) fn buffered() -> Self {
        Self {
            buffered: true,
            ..Self::default()
        }
    }

    pub(crate) fn records(&self) -> Vec<OutputRecord> {
        self.records.lock().unwrap().clone()
    }

    pub(crate) fn flushes(&self) -> usize {
        self.flushes.load(Ordering::SeqCst)
    }
}

impl Output for Capture {
    fn name(&self) -> &str {
        "capture"
    }

    fn run(&self, record: &OutputRecord) -> Result<()> {
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        self.flushes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn is_buffered(&self) -> bool {
        self.buffered
    }
}
