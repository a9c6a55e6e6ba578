//! The gas trend: stored readings turned into a chronological (date, gas) series.

use crate::model::StoredReading;
use crate::store::DataStore;
use crate::Result;
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

/// One plotted point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendPoint {
    pub date: DateTime<Utc>,
    pub gas: f64,
}

/// Builds the gas series from `readings`:
/// 1. every date is parsed, and a single unparseable date fails the whole series,
/// 2. points are sorted by date, keeping storage order for equal dates,
/// 3. readings with a gas value of 0 are dropped, as 0 means the meter was not read.
pub fn gas_series(readings: &[StoredReading]) -> Result<Vec<TrendPoint>> {
    let mut points = readings
        .iter()
        .map(|stored| {
            let date = stored.reading.timestamp().with_context(|| {
                format!(
                    "Unable to plot the reading {}",
                    stored.id.as_deref().unwrap_or("without an id")
                )
            })?;
            Ok((
                TrendPoint {
                    date,
                    gas: stored.reading.gas,
                },
                stored.reading.gas_missing(),
            ))
        })
        .collect::<Result<Vec<_>>>()?;
    points.sort_by_key(|(point, _)| point.date);
    let series: Vec<TrendPoint> = points
        .into_iter()
        .filter(|(_, missing)| !missing)
        .map(|(point, _)| point)
        .collect();
    debug!(
        "Built a gas series of {} points from {} readings",
        series.len(),
        readings.len()
    );
    Ok(series)
}

/// Fetches all readings and builds the gas series.
pub async fn load(store: &dyn DataStore) -> Result<Vec<TrendPoint>> {
    let readings = store.fetch_all().await?;
    gas_series(&readings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorType;
    use crate::model::MeterReading;

    fn stored(id: &str, date: &str, gas: f64) -> StoredReading {
        StoredReading::new(
            Some(id.into()),
            MeterReading {
                date: date.into(),
                electricity_day: 1.0,
                electricity_night: 1.0,
                electricity_car: 1.0,
                gas,
            },
        )
    }

    #[test]
    fn test_sorted_and_zero_gas_dropped() {
        let readings = vec![
            stored("c", "2024-03-01T00:00:00Z", 52000.0),
            stored("z", "2024-02-01T00:00:00Z", 0.0),
            stored("a", "2024-01-01", 50000.0),
            stored("b", "2024-02-15T00:00:00Z", 51000.0),
        ];
        let series = gas_series(&readings).unwrap();
        let gas: Vec<f64> = series.iter().map(|p| p.gas).collect();
        assert_eq!(gas, vec![50000.0, 51000.0, 52000.0]);
        assert!(series.windows(2).all(|w| w[0].date <= w[1].date));
        assert!(series.iter().all(|p| p.gas != 0.0));
    }

    #[test]
    fn test_duplicate_dates_keep_storage_order() {
        let readings = vec![
            stored("a", "2024-01-01", 50100.0),
            stored("b", "2024-01-01", 50000.0),
        ];
        let series = gas_series(&readings).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].gas, 50100.0);
        assert_eq!(series[1].gas, 50000.0);
    }

    #[test]
    fn test_unparseable_date_fails_everything() {
        let readings = vec![
            stored("a", "2024-01-01", 50000.0),
            stored("b", "last tuesday", 51000.0),
        ];
        let err = gas_series(&readings).unwrap_err();
        assert_eq!(ErrorType::of(&err), Some(ErrorType::Parse));
        assert!(format!("{err:#}").contains("last tuesday"));
    }

    #[test]
    fn test_unparseable_date_fails_even_when_gas_is_zero() {
        let readings = vec![stored("a", "???", 0.0)];
        assert!(gas_series(&readings).is_err());
    }

    #[test]
    fn test_empty() {
        assert!(gas_series(&[]).unwrap().is_empty());
        let only_zero = vec![stored("a", "2024-01-01", 0.0)];
        assert!(gas_series(&only_zero).unwrap().is_empty());
    }
}
