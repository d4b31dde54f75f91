//! `log`: emit each record through tracing.

use serde::Deserialize;
use tracing::{debug, info};

use stacforge_shared::{MethodOptions, OutputRecord, Result};

use super::{Output, parse_options};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Options {
    /// Include the full body in the event.
    body: bool,
}

#[derive(Debug, Default)]
pub struct LogOutput {
    body: bool,
}

impl LogOutput {
    pub const NAME: &'static str = "log";

    pub fn from_options(options: &MethodOptions) -> Result<Self> {
        let options: Options = parse_options(Self::NAME, options)?;
        Ok(Self { body: options.body })
    }
}

impl Output for LogOutput {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn run(&self, record: &OutputRecord) -> Result<()> {
        info!(
            id = %record.id,
            parent_id = record.parent_id.as_deref().unwrap_or(""),
            record_type = %record.record_type,
            uri = %record.uri,
            "record generated"
        );
        if self.body {
            let body = serde_json::Value::Object(record.body.clone());
            debug!(id = %record.id, body = %body, "record body");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use stacforge_shared::{GeneratorType, Record};

    #[test]
    fn accepts_records_and_is_not_buffered() {
        let output =
            LogOutput::from_options(json!({ "body": true }).as_object().unwrap()).expect("build");
        assert!(output.body);
        assert!(!output.is_buffered());

        let record = OutputRecord {
            id: "abc".into(),
            parent_id: None,
            record_type: GeneratorType::Item,
            uri: "/badc/faam".into(),
            body: Record::new(),
        };
        output.run(&record).expect("run");
        output.flush().expect("flush is a no-op");
    }
}
