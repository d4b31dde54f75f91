//! `date_combinator`: assemble a datetime from separately extracted
//! year, month, day and time fields.

use serde::Deserialize;
use tracing::debug;

use stacforge_shared::{MethodOptions, Record, Result, StacForgeError};

use super::iso_date::{ISO_FORMAT, parse_fallback, parse_with_format};
use super::{ExtractionMethod, parse_options, value_as_string};

#[derive(Debug, Deserialize)]
struct Options {
    #[serde(default = "default_year_key")]
    year_key: String,
    #[serde(default = "default_month_key")]
    month_key: String,
    #[serde(default = "default_day_key")]
    day_key: String,
    #[serde(default = "default_hour_key")]
    hour_key: String,
    #[serde(default = "default_minute_key")]
    minute_key: String,
    #[serde(default = "default_second_key")]
    second_key: String,
    #[serde(default)]
    format: Option<String>,
    #[serde(default = "default_output_key")]
    output_key: String,
    #[serde(default = "default_destructive")]
    destructive: bool,
}

fn default_year_key() -> String {
    "year".into()
}

fn default_month_key() -> String {
    "month".into()
}

fn default_day_key() -> String {
    "day".into()
}

fn default_hour_key() -> String {
    "hour".into()
}

fn default_minute_key() -> String {
    "minute".into()
}

fn default_second_key() -> String {
    "second".into()
}

fn default_output_key() -> String {
    "datetime".into()
}

fn default_destructive() -> bool {
    true
}

/// Datetime assembly from component fields.
#[derive(Debug)]
pub struct DateCombinator {
    date_keys: [String; 3],
    time_keys: [String; 3],
    format: Option<String>,
    output_key: String,
    destructive: bool,
}

impl DateCombinator {
    pub const NAME: &'static str = "date_combinator";

    pub fn from_options(options: &MethodOptions) -> Result<Self> {
        let options: Options = parse_options(Self::NAME, options)?;
        Ok(Self {
            date_keys: [options.year_key, options.month_key, options.day_key],
            time_keys: [options.hour_key, options.minute_key, options.second_key],
            format: options.format,
            output_key: options.output_key,
            destructive: options.destructive,
        })
    }

    fn components(&self, record: &Record, keys: &[String]) -> Vec<String> {
        keys.iter()
            .filter_map(|key| record.get(key).and_then(value_as_string))
            .collect()
    }
}

impl ExtractionMethod for DateCombinator {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn run(&self, record: &mut Record) -> Result<()> {
        let [year_key, ..] = &self.date_keys;
        if !record.contains_key(year_key) {
            return Err(StacForgeError::extraction(
                Self::NAME,
                format!("`{year_key}` is required to build a date"),
            ));
        }

        let date = self.components(record, &self.date_keys).join("-");
        let time = self.components(record, &self.time_keys).join(":");
        let combined = if time.is_empty() {
            date
        } else {
            format!("{date}T{time}")
        };

        let parsed = match &self.format {
            Some(format) => parse_with_format(&combined, format),
            None => parse_fallback(&combined),
        }
        .ok_or_else(|| {
            StacForgeError::extraction(Self::NAME, format!("unable to parse `{combined}`"))
        })?;

        debug!(combined = %combined, output_key = %self.output_key, "combined date");

        if self.destructive {
            for key in self.date_keys.iter().chain(&self.time_keys) {
                record.remove(key);
            }
        }
        record.insert(
            self.output_key.clone(),
            parsed.format(ISO_FORMAT).to_string().into(),
        );
        Ok(())
    }

    fn output_keys(&self) -> Vec<String> {
        vec![self.output_key.clone()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn method(options: serde_json::Value) -> DateCombinator {
        DateCombinator::from_options(options.as_object().unwrap()).expect("build")
    }

    fn ymd() -> Record {
        json!({ "year": "1850", "month": "02", "day": "01" })
            .as_object()
            .cloned()
            .unwrap()
    }

    #[test]
    fn joins_components_and_removes_them() {
        let mut record = ymd();
        method(json!({})).run(&mut record).expect("run");
        assert_eq!(
            serde_json::Value::Object(record),
            json!({ "datetime": "1850-02-01T00:00:00" })
        );
    }

    #[test]
    fn non_destructive_keeps_components() {
        let mut record = ymd();
        method(json!({ "destructive": false })).run(&mut record).expect("run");
        assert_eq!(record["year"], "1850");
        assert_eq!(record["datetime"], "1850-02-01T00:00:00");
    }

    #[test]
    fn custom_output_key() {
        let mut record = ymd();
        method(json!({ "output_key": "test" })).run(&mut record).expect("run");
        assert_eq!(
            serde_json::Value::Object(record),
            json!({ "test": "1850-02-01T00:00:00" })
        );
    }

    #[test]
    fn format_string_completes_missing_day() {
        let mut record = json!({ "year": "1850", "month": "02" }).as_object().cloned().unwrap();
        method(json!({ "format": "%Y-%m" })).run(&mut record).expect("run");
        assert_eq!(
            serde_json::Value::Object(record),
            json!({ "datetime": "1850-02-01T00:00:00" })
        );
    }

    #[test]
    fn includes_time_components() {
        let mut record = ymd();
        record.insert("hour".into(), json!("10"));
        record.insert("minute".into(), json!("30"));
        record.insert("second".into(), json!(5));
        method(json!({})).run(&mut record).expect("run");
        assert_eq!(record["datetime"], "1850-02-01T10:30:05");
        assert!(record.get("hour").is_none());
    }

    #[test]
    fn missing_year_fails() {
        let mut record = json!({ "month": "02", "day": "01" }).as_object().cloned().unwrap();
        assert!(method(json!({})).run(&mut record).is_err());
    }

    #[test]
    fn year_month_without_format_fails_and_keeps_data() {
        let mut record = json!({ "year": "1850", "month": "02" }).as_object().cloned().unwrap();
        let before = record.clone();
        assert!(method(json!({})).run(&mut record).is_err());
        assert_eq!(record, before);
    }
}
