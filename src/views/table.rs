//! The data table: every stored reading, unsorted and unfiltered.

use crate::model::{StoredReading, COLUMNS};
use crate::store::DataStore;
use crate::Result;
use anyhow::Context;
use serde::Serialize;

/// A grid of display strings with one row per stored reading, in storage order.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(readings: &[StoredReading]) -> Self {
        Self {
            columns: COLUMNS.iter().map(|c| c.to_string()).collect(),
            rows: readings.iter().map(StoredReading::cells).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Renders the table as CSV with a header row.
    pub fn to_csv(&self) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(&self.columns)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| anyhow::anyhow!("Unable to finish the CSV output: {e}"))?;
        String::from_utf8(bytes).context("The CSV output is not UTF-8")
    }
}

/// Fetches all readings and builds the table.
pub async fn load(store: &dyn DataStore) -> Result<Table> {
    let readings = store.fetch_all().await?;
    Ok(Table::new(&readings))
}
