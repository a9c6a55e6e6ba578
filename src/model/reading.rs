use crate::error::{ErrorType, IntoResult};
use crate::Result;
use anyhow::{anyhow, ensure, Context};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// The format used to write `MeterReading::date`, always midnight UTC.
pub const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Field names of a stored reading, in storage order. `_id` is assigned by the store.
pub const COLUMNS: [&str; 6] = [
    "_id",
    "date",
    "electricity_day",
    "electricity_night",
    "electricity_car",
    "gas",
];

/// The four meter counters entered together for one date. These are counter values as read off
/// the meters, not consumption deltas.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReadingValues {
    pub electricity_day: f64,
    pub electricity_night: f64,
    pub electricity_car: f64,
    pub gas: f64,
}

impl ReadingValues {
    /// Every value must be finite and not negative.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in self.named() {
            ensure!(value.is_finite(), "{name} must be a number, got {value}");
            ensure!(value >= 0.0, "{name} must not be negative, got {value}");
        }
        Ok(())
    }

    fn named(&self) -> [(&'static str, f64); 4] {
        [
            ("electricity_day", self.electricity_day),
            ("electricity_night", self.electricity_night),
            ("electricity_car", self.electricity_car),
            ("gas", self.gas),
        ]
    }
}

/// One submitted record of utility counter values for a given date, exactly as it is written to
/// the document store.
///
/// `date` is kept as the stored string: documents written by other tools are read back unchanged
/// and only parsed where a chronological value is needed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeterReading {
    pub date: String,
    pub electricity_day: f64,
    pub electricity_night: f64,
    pub electricity_car: f64,
    pub gas: f64,
}

impl MeterReading {
    /// Builds a reading for `date`, serialized as an ISO-8601 timestamp at midnight UTC.
    pub fn new(date: NaiveDate, values: ReadingValues) -> Self {
        Self {
            date: format_reading_date(date),
            electricity_day: values.electricity_day,
            electricity_night: values.electricity_night,
            electricity_car: values.electricity_car,
            gas: values.gas,
        }
    }

    pub fn values(&self) -> ReadingValues {
        ReadingValues {
            electricity_day: self.electricity_day,
            electricity_night: self.electricity_night,
            electricity_car: self.electricity_car,
            gas: self.gas,
        }
    }

    /// Parses `date` into a timestamp.
    pub fn timestamp(&self) -> Result<DateTime<Utc>> {
        parse_reading_date(&self.date)
    }

    /// Checks the record invariants: all counters are non-negative and `date` parses.
    pub fn validate(&self) -> Result<()> {
        self.values()
            .validate()
            .context("Invalid meter reading")
            .pub_result(ErrorType::Validation)?;
        self.timestamp()
            .context("Invalid meter reading")
            .map(|_| ())
    }

    /// True when the gas meter was not read for this period. Zero is a sentinel for missing data,
    /// never a real reading.
    pub fn gas_missing(&self) -> bool {
        self.gas == 0.0
    }
}

/// A record as returned by the store, with the identifier the store assigned to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredReading {
    pub id: Option<String>,
    pub reading: MeterReading,
}

impl StoredReading {
    pub fn new(id: Option<String>, reading: MeterReading) -> Self {
        Self { id, reading }
    }

    /// The field values as display strings, in `COLUMNS` order.
    pub fn cells(&self) -> Vec<String> {
        let r = &self.reading;
        vec![
            self.id.clone().unwrap_or_default(),
            r.date.clone(),
            r.electricity_day.to_string(),
            r.electricity_night.to_string(),
            r.electricity_car.to_string(),
            r.gas.to_string(),
        ]
    }
}

/// Formats a calendar date the way readings are stored, e.g. `2024-01-01T00:00:00Z`.
pub fn format_reading_date(date: NaiveDate) -> String {
    date.and_time(chrono::NaiveTime::MIN)
        .and_utc()
        .format(DATE_FORMAT)
        .to_string()
}

/// Parses a stored date. Accepts RFC 3339 timestamps, timestamps without an offset (taken as UTC)
/// and plain `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_reading_date(s: &str) -> Result<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt.and_utc());
        }
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(d.and_time(chrono::NaiveTime::MIN).and_utc());
    }
    Err(anyhow!("Unable to parse '{s}' as a date")).pub_result(ErrorType::Parse)
}
