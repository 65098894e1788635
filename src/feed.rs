//! ==============================================================================
//! feed.rs - json feed decoder (primary path)
//! ==============================================================================
//!
//! purpose:
//!     maps the flat records served by the sensor feed into `Reading` values.
//!     the batch is all-or-nothing: one bad timestamp fails the whole decode.
//!
//! relationships:
//!     - used by: upstream.rs (after the http fetch)
//!     - shares: parse_timestamp with html/decoder.rs
//!
//! ==============================================================================

use crate::domain::{Position, Reading};
use crate::error::ParseError;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;

/// the only timestamp layout either upstream format uses
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// one record as served by the feed
#[derive(Debug, Clone, Deserialize)]
pub struct FeedRecord {
    pub id: i64,
    pub timestamp: String,
    pub temperature: f32,
    pub humidity: f32,
    /// supply voltage
    pub supply: f32,
    pub firmware_version: i64,
    pub latitude: f32,
    pub longitude: f32,

    // newer firmware reports these; older records omit them
    #[serde(default)]
    pub light: Option<f32>,
    #[serde(default, rename = "pm2.5")]
    pub pm25: Option<f32>,
    #[serde(default)]
    pub pm10: Option<f32>,
    #[serde(default)]
    pub fcnt: Option<i64>,
}

/// parse a `YYYY-MM-DD HH:MM:SS` timestamp as utc
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, ParseError> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|source| ParseError::Timestamp {
            value: value.to_string(),
            source,
        })
}

/// decode a whole batch, preserving order
pub fn decode_records(records: &[FeedRecord]) -> Result<Vec<Reading>, ParseError> {
    records.iter().map(decode_record).collect()
}

fn decode_record(record: &FeedRecord) -> Result<Reading, ParseError> {
    let date = parse_timestamp(&record.timestamp)?;

    let mut reading = Reading::at(record.id.to_string(), date);
    reading.temperature = record.temperature;
    reading.humidity = record.humidity;
    reading.voltage = record.supply;
    reading.light = record.light.unwrap_or_default();
    reading.pm25 = record.pm25.unwrap_or_default();
    reading.pm10 = record.pm10.unwrap_or_default();
    reading.fcnt = record.fcnt.unwrap_or_default();
    reading.firmware_version = record.firmware_version.to_string();
    reading.position = Position {
        lat: record.latitude,
        lng: record.longitude,
    };

    Ok(reading)
}
