//! Error kinds for validation, upstream fetches and decoding.

use thiserror::Error;

/// bad or missing query parameters, answered with `400`
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("missing sensor ID")]
    MissingSensor,

    #[error("sensor ID must be numeric")]
    InvalidSensor,

    #[error("{value} is not a number ({source})")]
    InvalidLimit {
        value: String,
        source: std::num::ParseIntError,
    },

    #[error("maximum allowed number of items is {max}")]
    LimitTooHigh { max: i64 },
}

/// the remote feed could not be reached or returned something unusable
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("error reading '{url}': {source}")]
    Request { url: String, source: reqwest::Error },

    #[error("error reading '{url}': upstream answered {status}")]
    Status { url: String, status: reqwest::StatusCode },

    #[error("error unmarshaling data: '{0}'")]
    Payload(#[from] serde_json::Error),
}

/// a single field or record could not be decoded
#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("invalid timestamp '{value}': {source}")]
    Timestamp {
        value: String,
        source: chrono::ParseError,
    },

    #[error("invalid {field} '{value}': {reason}")]
    Number {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("{field} '{value}' is too short to carry a {len}-byte unit suffix")]
    Unit {
        field: &'static str,
        value: String,
        len: usize,
    },

    #[error("unable to parse {key} from '{uri}': {reason}")]
    Coordinate {
        key: &'static str,
        uri: String,
        reason: String,
    },

    #[error("radio settings '{0}' do not hold frequency, sf and cr")]
    RadioSettings(String),
}

/// everything a fetch-and-decode round trip can fail with
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
