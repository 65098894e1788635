//! meetjestad-proxy
//!
//! Proxies the Meet je Stad sensor feed and reshapes its records into one
//! normalized `Reading` document. The current feed is JSON; the legacy html
//! table page is still understood as a fallback format.

pub mod config;
pub mod domain;
pub mod error;
pub mod feed;
pub mod html;
pub mod server;
pub mod upstream;

pub use config::ProxyConfig;
pub use domain::{Gateway, Position, RadioSettings, Reading};
pub use error::{Error, ParseError, UpstreamError, ValidationError};
pub use upstream::{FeedSource, HttpFeed};
