//! The reading form: parses what the user submitted and writes it to the store.

use crate::error::{ErrorType, IntoResult};
use crate::model::{MeterReading, ReadingValues};
use crate::store::DataStore;
use crate::Result;
use anyhow::{anyhow, Context};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

/// The raw form fields, exactly as submitted. Kept as strings so that a rejected submission can be
/// shown back to the user unchanged.
#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct EntryForm {
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub electricity_day: String,
    #[serde(default)]
    pub electricity_night: String,
    #[serde(default)]
    pub electricity_car: String,
    #[serde(default)]
    pub gas: String,
}

impl EntryForm {
    /// An empty form for `today`: the date is preset and every counter is 0.
    pub fn blank(today: NaiveDate) -> Self {
        Self {
            date: today.format("%Y-%m-%d").to_string(),
            electricity_day: "0".into(),
            electricity_night: "0".into(),
            electricity_car: "0".into(),
            gas: "0".into(),
        }
    }

    /// Parses and validates the fields into a `MeterReading`.
    ///
    /// # Errors
    /// A `Validation` error when the date is not `YYYY-MM-DD` or a counter is missing, not a
    /// number or negative.
    pub fn parse(&self) -> Result<MeterReading> {
        let date = NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d")
            .with_context(|| format!("'{}' is not a valid date", self.date))
            .pub_result(ErrorType::Validation)?;
        let values = ReadingValues {
            electricity_day: parse_counter("Electricity Day", &self.electricity_day)?,
            electricity_night: parse_counter("Electricity Night", &self.electricity_night)?,
            electricity_car: parse_counter("Electricity Car", &self.electricity_car)?,
            gas: parse_counter("Gas", &self.gas)?,
        };
        values.validate().pub_result(ErrorType::Validation)?;
        Ok(MeterReading::new(date, values))
    }
}

fn parse_counter(label: &str, value: &str) -> Result<f64> {
    let value = value.trim();
    if value.is_empty() {
        return Err(anyhow!("{label} is required")).pub_result(ErrorType::Validation);
    }
    let n: f64 = value
        .parse()
        .map_err(|_| anyhow!("{label} must be a number, got '{value}'"))
        .pub_result(ErrorType::Validation)?;
    if !n.is_finite() || n < 0.0 {
        return Err(anyhow!("{label} must be 0 or more, got '{value}'"))
            .pub_result(ErrorType::Validation);
    }
    Ok(n)
}

/// Parses `form` and inserts the reading. Nothing is written when the form is invalid. Duplicate
/// dates are accepted.
pub async fn submit(store: &dyn DataStore, form: &EntryForm) -> Result<MeterReading> {
    let reading = form.parse()?;
    store.insert(&reading).await?;
    info!("Stored the reading for {}", reading.date);
    Ok(reading)
}
