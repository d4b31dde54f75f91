//! Running a generator over many identifiers.
//!
//! Record-scoped failures are counted and the batch moves on; anything else
//! stops the run.

use tracing::{error, info, warn};

use stacforge_shared::{OutputRecord, Result, StacForgeError};

use crate::generator::Generator;

/// Progress callback for reporting batch status.
pub trait ProgressReporter: Send + Sync {
    /// Called after each identifier.
    fn record_done(&self, uri: &str, outcome: RecordOutcome);
    /// Called once the batch has been flushed.
    fn done(&self, summary: &BatchSummary);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn record_done(&self, _uri: &str, _outcome: RecordOutcome) {}
    fn done(&self, _summary: &BatchSummary) {}
}

/// What happened to one identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    Generated,
    /// No description covers the identifier and the caller opted to skip.
    Skipped,
    /// Dropped by a record-scoped failure.
    Failed,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BatchOptions {
    /// Treat `NoDescriptionFound` as a skip rather than a fatal error.
    pub skip_undescribed: bool,
}

/// Outcome counts for a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub generated: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl BatchSummary {
    /// Account for one identifier's result. Errors that are fatal to the run
    /// are handed back.
    pub fn record(
        &mut self,
        uri: &str,
        result: Result<OutputRecord>,
        options: BatchOptions,
    ) -> Result<RecordOutcome> {
        match result {
            Ok(_) => {
                self.generated += 1;
                Ok(RecordOutcome::Generated)
            }
            Err(StacForgeError::NoDescriptionFound { .. }) if options.skip_undescribed => {
                warn!(uri, "no description covers identifier, skipping");
                self.skipped += 1;
                Ok(RecordOutcome::Skipped)
            }
            Err(e) if e.is_record_scoped() => {
                error!(uri, error = %e, "record dropped");
                self.failed += 1;
                Ok(RecordOutcome::Failed)
            }
            Err(e) => Err(e),
        }
    }

    pub fn total(&self) -> usize {
        self.generated + self.skipped + self.failed
    }
}

/// Process every identifier in order, then flush buffering outputs.
pub fn run_batch<I, S>(
    generator: &Generator,
    uris: I,
    options: BatchOptions,
    progress: &dyn ProgressReporter,
) -> Result<BatchSummary>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut summary = BatchSummary::default();

    for uri in uris {
        let uri = uri.as_ref();
        let outcome = summary.record(uri, generator.process(uri), options)?;
        progress.record_done(uri, outcome);
    }

    generator.finished()?;
    info!(
        record_type = %generator.generator_type(),
        generated = summary.generated,
        skipped = summary.skipped,
        failed = summary.failed,
        "batch finished"
    );
    progress.done(&summary);
    Ok(summary)
}
