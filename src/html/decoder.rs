//! ==============================================================================
//! decoder.rs - legacy html table decoder
//! ==============================================================================
//!
//! purpose:
//!     turns the readings table of the old sensor page into `Reading` values.
//!     continuation rows are grouped under the primary row above them.
//!
//! failure model:
//!     a bad row never fails the table. it is logged and dropped, and the
//!     decoder carries on with the next row. this is the opposite of the
//!     json path, where one bad record fails the batch.
//!
//! unit suffixes:
//!     lengths are in utf-8 bytes, as the page renders them: "°C" is 3,
//!     "MHz" 3, "km" 2, "%" and "V" 1.
//!
//! ==============================================================================

use super::node::{parse_document, Element, Node};
use super::rows::{classify, table_rows, GatewayCells, PrimaryCells, Row};
use crate::domain::{Gateway, Position, RadioSettings, Reading};
use crate::error::ParseError;
use crate::feed::parse_timestamp;

use tracing::{debug, warn};

/// parse an html page and decode its first table
pub fn decode_html(source: &str) -> Vec<Reading> {
    decode_document(&parse_document(source))
}

/// decode the first `<table>` found anywhere under `document`
pub fn decode_document(document: &Node) -> Vec<Reading> {
    match document.find_first("table") {
        Some(table) => decode_table(table),
        None => {
            debug!("[HTML] document has no table");
            Vec::new()
        }
    }
}

pub fn decode_table(table: &Element) -> Vec<Reading> {
    let mut readings: Vec<Reading> = Vec::new();
    // false until a primary row decodes, and again after one fails, so
    // gateways never attach to the wrong reading
    let mut accepting_gateways = false;

    for (index, row) in table_rows(table).into_iter().enumerate() {
        match classify(row) {
            Row::Header => {}
            Row::Primary(cells) => match decode_primary(&cells) {
                Ok(reading) => {
                    debug!("[HTML] decoded reading\n{}", reading);
                    readings.push(reading);
                    accepting_gateways = true;
                }
                Err(e) => {
                    warn!(row = index, "[HTML] error parsing row: {}", e);
                    accepting_gateways = false;
                }
            },
            Row::Continuation(cells) => {
                let reading = match readings.last_mut() {
                    Some(reading) if accepting_gateways => reading,
                    _ => {
                        warn!(row = index, "[HTML] gateway row has no reading to attach to");
                        continue;
                    }
                };
                match decode_gateway(&cells) {
                    Ok(gateway) => reading.gateways.push(gateway),
                    Err(e) => warn!(row = index, "[HTML] error parsing gateway: {}", e),
                }
            }
            Row::Malformed { cells } => {
                warn!(row = index, "[HTML] row has unexpected number of cells: {}", cells);
            }
        }
    }

    readings
}

fn decode_primary(cells: &PrimaryCells<'_>) -> Result<Reading, ParseError> {
    let date = parse_timestamp(cells.timestamp.text())?;

    let mut reading = Reading::at(sensor_id(cells.sensor), date);
    let temperature = strip_unit("temperature", cells.temperature.text(), 3)?;
    reading.temperature = parse_f32("temperature", temperature)?;
    let humidity = strip_unit("humidity", cells.humidity.text(), 1)?;
    reading.humidity = parse_f32("humidity", humidity)?;
    let voltage = strip_unit("voltage", cells.voltage.text(), 1)?;
    reading.voltage = parse_f32("voltage", voltage)?;
    reading.firmware_version = cells.firmware.text().to_string();
    reading.position = cell_position(cells.position)?;

    let fcnt = cells.fcnt.text();
    reading.fcnt = fcnt.parse::<i64>().map_err(|e| ParseError::Number {
        field: "fcnt",
        value: fcnt.to_string(),
        reason: e.to_string(),
    })?;

    reading.gateways.push(decode_gateway(&cells.gateway)?);
    Ok(reading)
}

fn decode_gateway(cells: &GatewayCells<'_>) -> Result<Gateway, ParseError> {
    let mut gateway = Gateway::default();

    // any link content carries the href, only text names the gateway
    if let Some(link) = cells.link.first_child_element() {
        if !link.children.is_empty() {
            gateway.position = link_position(link.attr("href").unwrap_or_default())?;
            let name = link.text();
            if !name.is_empty() {
                gateway.name = name.to_string();
            }
        }
    }

    let distance = cells.distance.text();
    if distance.len() > 2 {
        gateway.distance = parse_f32("distance", strip_unit("distance", distance, 2)?)?;
    }

    gateway.rssi = parse_f32("rssi", cells.rssi.text())?;
    gateway.lsnr = parse_f32("lsnr", cells.lsnr.text())?;
    gateway.radio_settings = radio_settings(cells.radio.text())?;

    Ok(gateway)
}

/// plain text first, then a link wrapping the id
fn sensor_id(cell: &Element) -> String {
    cell.children
        .iter()
        .take(2)
        .map(|node| match node {
            Node::Text(text) => text.trim(),
            Node::Element(element) => element.text(),
        })
        .find(|text| !text.is_empty())
        .unwrap_or_default()
        .to_string()
}

/// "<lat> ... <lng>" inside the cell's link
fn cell_position(cell: &Element) -> Result<Position, ParseError> {
    let Some(link) = cell.first_child_element() else {
        return Ok(Position::default());
    };

    let mut tokens = link.text().split_whitespace();
    let (Some(lat), lng) = (tokens.next(), tokens.last()) else {
        return Ok(Position::default());
    };

    Ok(Position {
        lat: parse_f32("latitude", lat)?,
        lng: parse_f32("longitude", lng.unwrap_or(lat))?,
    })
}

fn link_position(uri: &str) -> Result<Position, ParseError> {
    Ok(Position {
        lat: query_coordinate(uri, "mlat")?,
        lng: query_coordinate(uri, "mlon")?,
    })
}

/// the value after `<key>=`, up to the next `&`; 0 when the key is absent
fn query_coordinate(uri: &str, key: &'static str) -> Result<f32, ParseError> {
    let needle = format!("{key}=");
    let Some(start) = uri.find(&needle) else {
        return Ok(0.0);
    };

    let rest = &uri[start + needle.len()..];
    let value = rest.split('&').next().unwrap_or_default();
    value.parse::<f32>().map_err(|e| ParseError::Coordinate {
        key,
        uri: uri.to_string(),
        reason: e.to_string(),
    })
}

/// "<frequency>MHz, <sf>, <cr>"
fn radio_settings(text: &str) -> Result<RadioSettings, ParseError> {
    let parts: Vec<&str> = text.split(',').collect();
    let [frequency, sf, cr, ..] = parts.as_slice() else {
        return Err(ParseError::RadioSettings(text.to_string()));
    };

    Ok(RadioSettings {
        frequency: parse_f32("frequency", strip_unit("frequency", frequency.trim(), 3)?)?,
        spreading_factor: sf.trim().to_string(),
        coding_rate: cr.trim().to_string(),
    })
}

/// drop a `len`-byte unit suffix and trim what is left
fn strip_unit<'a>(field: &'static str, text: &'a str, len: usize) -> Result<&'a str, ParseError> {
    text.len()
        .checked_sub(len)
        .and_then(|end| text.get(..end))
        .map(str::trim)
        .ok_or_else(|| ParseError::Unit {
            field,
            value: text.to_string(),
            len,
        })
}

fn parse_f32(field: &'static str, value: &str) -> Result<f32, ParseError> {
    value.parse::<f32>().map_err(|e| ParseError::Number {
        field,
        value: value.to_string(),
        reason: e.to_string(),
    })
}
