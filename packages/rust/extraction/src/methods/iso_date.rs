//! `iso_date`: normalize date fields to `YYYY-MM-DDTHH:MM:SS`.
//!
//! A configured `format` is tried first. If it does not fit the value, a
//! fixed list of common layouts is tried next. Values nothing can parse are
//! removed from the record.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Deserialize;
use tracing::{error, warn};

use stacforge_shared::{MethodOptions, Record, Result};

use super::{ExtractionMethod, parse_options, value_as_string};

/// Layout every normalized date is written in.
pub(crate) const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

const FALLBACK_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y%m%dT%H%M%S",
    "%Y%m%d%H%M%S",
];

const FALLBACK_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y%m%d", "%Y/%m/%d"];

/// Parse `value` with an explicit layout. Layouts without a day of month
/// are completed with the first of the month.
pub(crate) fn parse_with_format(value: &str, format: &str) -> Option<NaiveDateTime> {
    if let Ok(datetime) = NaiveDateTime::parse_from_str(value, format) {
        return Some(datetime);
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, format) {
        return Some(date.and_time(NaiveTime::MIN));
    }
    if !format.contains("%d") {
        let value = format!("{value}01");
        let format = format!("{format}%d");
        return NaiveDate::parse_from_str(&value, &format)
            .ok()
            .map(|date| date.and_time(NaiveTime::MIN));
    }
    None
}

/// Parse `value` against RFC 3339 and the common layouts.
pub(crate) fn parse_fallback(value: &str) -> Option<NaiveDateTime> {
    if let Ok(datetime) = DateTime::parse_from_rfc3339(value) {
        return Some(datetime.naive_utc());
    }
    FALLBACK_DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .or_else(|| {
            FALLBACK_DATE_FORMATS.iter().find_map(|format| {
                NaiveDate::parse_from_str(value, format)
                    .ok()
                    .map(|date| date.and_time(NaiveTime::MIN))
            })
        })
}

#[derive(Debug, Deserialize)]
struct Options {
    #[serde(default)]
    date_keys: Vec<String>,
    #[serde(default)]
    format: Option<String>,
}

/// ISO 8601 date normalization.
#[derive(Debug)]
pub struct IsoDate {
    date_keys: Vec<String>,
    format: Option<String>,
}

impl IsoDate {
    pub const NAME: &'static str = "iso_date";

    pub fn from_options(options: &MethodOptions) -> Result<Self> {
        let options: Options = parse_options(Self::NAME, options)?;
        Ok(Self {
            date_keys: options.date_keys,
            format: options.format,
        })
    }

    fn parse(&self, key: &str, value: &str) -> Option<NaiveDateTime> {
        if let Some(format) = &self.format {
            if let Some(datetime) = parse_with_format(value, format) {
                return Some(datetime);
            }
            warn!(key, value, format = %format, "date does not match format, trying common layouts");
        }
        parse_fallback(value)
    }
}

impl ExtractionMethod for IsoDate {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn run(&self, record: &mut Record) -> Result<()> {
        for key in &self.date_keys {
            let Some(value) = record.get(key) else {
                continue;
            };

            let parsed = value_as_string(value).and_then(|text| self.parse(key, &text));
            match parsed {
                Some(datetime) => {
                    record.insert(key.clone(), datetime.format(ISO_FORMAT).to_string().into());
                }
                None => {
                    error!(key, value = %value, "unable to parse date, removing it");
                    record.remove(key);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn method(format: Option<&str>) -> IsoDate {
        let mut options = json!({ "date_keys": ["date"] });
        if let Some(format) = format {
            options["format"] = json!(format);
        }
        IsoDate::from_options(options.as_object().unwrap()).expect("build")
    }

    fn record(date: &str) -> Record {
        json!({ "date": date }).as_object().cloned().unwrap()
    }

    #[test]
    fn normalizes_plain_date() {
        let mut record = record("2021-05-02");
        method(None).run(&mut record).expect("run");
        assert_eq!(record["date"], "2021-05-02T00:00:00");
    }

    #[test]
    fn unparseable_date_is_removed() {
        let mut record = record("202105");
        method(None).run(&mut record).expect("run");
        assert!(record.is_empty());
    }

    #[test]
    fn format_without_day_uses_first_of_month() {
        let mut record = record("202105");
        method(Some("%Y%m")).run(&mut record).expect("run");
        assert_eq!(record["date"], "2021-05-01T00:00:00");
    }

    #[test]
    fn mismatched_format_falls_back_to_common_layouts() {
        let mut record = record("20210501");
        method(Some("%Y%m")).run(&mut record).expect("run");
        assert_eq!(record["date"], "2021-05-01T00:00:00");
    }

    #[test]
    fn mismatched_format_and_no_layout_removes_date() {
        let mut record = record("2021010101");
        method(Some("%Y%m")).run(&mut record).expect("run");
        assert!(record.is_empty());
    }

    #[test]
    fn rfc3339_is_converted_to_utc() {
        let mut record = record("2021-05-02T12:00:00+02:00");
        method(None).run(&mut record).expect("run");
        assert_eq!(record["date"], "2021-05-02T10:00:00");
    }

    #[test]
    fn absent_keys_are_ignored() {
        let mut record = json!({ "other": 1 }).as_object().cloned().unwrap();
        method(None).run(&mut record).expect("run");
        assert_eq!(record["other"], 1);
    }
}
