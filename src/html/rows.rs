//! Row classification for the legacy readings table.
//!
//! The table mixes two row layouts. A primary row has 17 cells and carries a
//! reading together with its first gateway. A continuation row has 5 cells
//! and carries one more gateway for the reading above it. Header rows have
//! no `<td>` cells at all.

use super::node::Element;

pub const PRIMARY_CELLS: usize = 17;
pub const GATEWAY_CELLS: usize = 5;

/// the five cells describing one gateway
#[derive(Debug, Clone, Copy)]
pub struct GatewayCells<'a> {
    pub link: &'a Element,
    pub distance: &'a Element,
    pub rssi: &'a Element,
    pub lsnr: &'a Element,
    pub radio: &'a Element,
}

/// the cells of a primary row that carry data
///
/// cells 4, 5, 6 and 8 are not part of the reading.
#[derive(Debug, Clone, Copy)]
pub struct PrimaryCells<'a> {
    pub sensor: &'a Element,
    pub timestamp: &'a Element,
    pub temperature: &'a Element,
    pub humidity: &'a Element,
    pub voltage: &'a Element,
    pub firmware: &'a Element,
    pub position: &'a Element,
    pub fcnt: &'a Element,
    pub gateway: GatewayCells<'a>,
}

#[derive(Debug, Clone, Copy)]
pub enum Row<'a> {
    Header,
    Primary(PrimaryCells<'a>),
    Continuation(GatewayCells<'a>),
    Malformed { cells: usize },
}

/// classify a `<tr>` by its number of `<td>` cells
pub fn classify(row: &Element) -> Row<'_> {
    let cells: Vec<&Element> = row.child_elements_named("td").collect();

    match cells.as_slice() {
        [] => Row::Header,
        &[link, distance, rssi, lsnr, radio] => Row::Continuation(GatewayCells {
            link,
            distance,
            rssi,
            lsnr,
            radio,
        }),
        &[
            sensor,
            timestamp,
            temperature,
            humidity,
            _,
            _,
            _,
            voltage,
            _,
            firmware,
            position,
            fcnt,
            link,
            distance,
            rssi,
            lsnr,
            radio,
        ] => {
            Row::Primary(PrimaryCells {
                sensor,
                timestamp,
                temperature,
                humidity,
                voltage,
                firmware,
                position,
                fcnt,
                gateway: GatewayCells {
                    link,
                    distance,
                    rssi,
                    lsnr,
                    radio,
                },
            })
        }
        other => Row::Malformed { cells: other.len() },
    }
}

/// the `<tr>` rows of a table, looking through thead/tbody/tfoot sections
pub fn table_rows(table: &Element) -> Vec<&Element> {
    let mut rows = Vec::new();
    for child in table.child_elements() {
        match child.name.as_str() {
            "tr" => rows.push(child),
            "thead" | "tbody" | "tfoot" => rows.extend(child.child_elements_named("tr")),
            _ => {}
        }
    }
    rows
}
