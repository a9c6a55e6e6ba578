//! Types that represent the core data model: the `MeterReading` and how it is stored.
mod reading;

pub use reading::{
    format_reading_date, parse_reading_date, MeterReading, ReadingValues, StoredReading, COLUMNS,
    DATE_FORMAT,
};
