//! Error types for stacforge.
//!
//! Library crates use [`StacForgeError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all stacforge operations.
#[derive(Debug, thiserror::Error)]
pub enum StacForgeError {
    /// No description file covers the given dataset identifier.
    #[error("no description found for {uri}")]
    NoDescriptionFound { uri: String },

    /// A description file is missing or could not be parsed.
    #[error("failed to load description {path:?}: {message}")]
    DescriptionLoad { path: PathBuf, message: String },

    /// A single extraction method failed against a record.
    #[error("extraction method `{method}` failed: {message}")]
    ExtractionMethod { method: String, message: String },

    /// No identifier could be produced for a required section.
    #[error("could not identify {record_type} record for {uri}: {message}")]
    Identification {
        record_type: String,
        uri: String,
        message: String,
    },

    /// A cached merge result disagrees with a fresh recomputation.
    #[error("merge cache corruption for [{files}]")]
    MergeCacheCorruption { files: String },

    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// A mapping capability failed to transform a record.
    #[error("mapping error: {0}")]
    Mapping(String),

    /// An output sink failed to write a record.
    #[error("output error: {0}")]
    Output(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (bad option values, malformed records, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, StacForgeError>;

impl StacForgeError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// An output sink could not write to `path`. Record-scoped, unlike [`Self::io`].
    pub fn output_io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        Self::Output(format!("{}: {source}", path.as_ref().display()))
    }

    /// A description file failed to load or parse.
    pub fn description_load(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::DescriptionLoad {
            path: path.into(),
            message: msg.into(),
        }
    }

    /// An extraction method failed.
    pub fn extraction(method: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::ExtractionMethod {
            method: method.into(),
            message: msg.into(),
        }
    }

    /// A required identifier could not be produced.
    pub fn identification(
        record_type: impl Into<String>,
        uri: impl Into<String>,
        msg: impl Into<String>,
    ) -> Self {
        Self::Identification {
            record_type: record_type.into(),
            uri: uri.into(),
            message: msg.into(),
        }
    }

    /// Whether this error only invalidates the record being processed.
    ///
    /// Record-scoped errors let a batch skip the offending identifier and
    /// continue; everything else indicates misconfiguration and should stop
    /// the run. `NoDescriptionFound` is reported as not record-scoped: the
    /// caller opts in to skipping it.
    pub fn is_record_scoped(&self) -> bool {
        matches!(
            self,
            Self::ExtractionMethod { .. }
                | Self::Identification { .. }
                | Self::Mapping(_)
                | Self::Output(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = StacForgeError::config("missing description_root");
        assert_eq!(err.to_string(), "config error: missing description_root");

        let err = StacForgeError::NoDescriptionFound {
            uri: "/badc/faam/data.nc".into(),
        };
        assert!(err.to_string().contains("/badc/faam/data.nc"));

        let err = StacForgeError::identification("item", "/a/b.nc", "no item_id");
        assert_eq!(
            err.to_string(),
            "could not identify item record for /a/b.nc: no item_id"
        );
    }

    #[test]
    fn record_scoped_errors() {
        assert!(StacForgeError::extraction("bbox", "missing west").is_record_scoped());
        assert!(StacForgeError::identification("asset", "/x", "none").is_record_scoped());
        assert!(StacForgeError::Output("disk full".into()).is_record_scoped());
        let denied = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert!(StacForgeError::output_io("/out/a.json", denied).is_record_scoped());

        assert!(!StacForgeError::description_load("/d/a.yml", "bad yaml").is_record_scoped());
        assert!(!StacForgeError::NoDescriptionFound { uri: "/x".into() }.is_record_scoped());
        assert!(
            !StacForgeError::MergeCacheCorruption {
                files: "a.yml".into()
            }
            .is_record_scoped()
        );
    }
}
