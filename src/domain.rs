//! ==============================================================================
//! domain.rs - normalized reading model
//! ==============================================================================
//!
//! purpose:
//!     the single output shape produced by every decoder (json feed, html table).
//!     values are built once per request, serialized, and dropped.
//!
//! relationships:
//!     - built by: feed.rs (json path), html/decoder.rs (legacy html path)
//!     - served by: server.rs (as a json array)
//!
//! ==============================================================================

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// a geographic coordinate
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub lat: f32,
    pub lng: f32,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}:{:.6}", self.lat, self.lng)
    }
}

/// lora modulation parameters used to transmit a reading
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RadioSettings {
    /// carrier frequency in MHz
    pub frequency: f32,
    /// spreading factor, opaque (e.g. "SF7BW125")
    #[serde(rename = "sf")]
    pub spreading_factor: String,
    /// coding rate, opaque (e.g. "4/5")
    #[serde(rename = "cr")]
    pub coding_rate: String,
}

impl fmt::Display for RadioSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Frequency={:.3} Sf={} Cr={}",
            self.frequency, self.spreading_factor, self.coding_rate
        )
    }
}

/// a relay that received a reading and forwarded it to the backend
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Gateway {
    pub name: String,
    #[serde(rename = "coordinates")]
    pub position: Position,
    /// distance from the sensor in km
    pub distance: f32,
    pub rssi: f32,
    pub lsnr: f32,
    pub radio_settings: RadioSettings,
}

impl fmt::Display for Gateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Name={} Position={} Distance={:.2} RSSI={:.1} LSNR={:.1} RadioSettings=[{}]",
            self.name, self.position, self.distance, self.rssi, self.lsnr, self.radio_settings
        )
    }
}

/// one sensor telemetry sample
///
/// `gateways` holds one entry per relay in the order the source listed them.
/// the json feed carries no relay data, so it is empty on that path.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub sensor_id: String,
    /// unix seconds
    pub timestamp: i64,
    pub date: DateTime<Utc>,
    pub temperature: f32,
    pub humidity: f32,
    pub light: f32,
    pub pm25: f32,
    pub pm10: f32,
    pub voltage: f32,
    pub firmware_version: String,
    #[serde(rename = "coordinates")]
    pub position: Position,
    pub fcnt: i64,
    pub gateways: Vec<Gateway>,
}

impl Reading {
    /// an empty reading stamped with `date`; decoders fill in the rest
    pub fn at(sensor_id: impl Into<String>, date: DateTime<Utc>) -> Self {
        Self {
            sensor_id: sensor_id.into(),
            timestamp: date.timestamp(),
            date,
            temperature: 0.0,
            humidity: 0.0,
            light: 0.0,
            pm25: 0.0,
            pm10: 0.0,
            voltage: 0.0,
            firmware_version: String::new(),
            position: Position::default(),
            fcnt: 0,
            gateways: Vec::new(),
        }
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ID={}", self.sensor_id)?;
        writeln!(f, "Time={}", self.date.to_rfc3339_opts(SecondsFormat::Secs, true))?;
        writeln!(f, "Temp={:.2}", self.temperature)?;
        writeln!(f, "Humidity={:.2}", self.humidity)?;
        writeln!(f, "Light={:.2}", self.light)?;
        writeln!(f, "PM25={:.2}", self.pm25)?;
        writeln!(f, "PM10={:.2}", self.pm10)?;
        writeln!(f, "Voltage={:.2}", self.voltage)?;
        writeln!(f, "Firmware={}", self.firmware_version)?;
        writeln!(f, "Position={}", self.position)?;
        writeln!(f, "Fcnt={}", self.fcnt)?;
        write!(f, "Gateways:")?;
        for (i, gateway) in self.gateways.iter().enumerate() {
            write!(f, "\n  {} {}", i, gateway)?;
        }
        Ok(())
    }
}
