//! Legacy html table support.
//!
//! The sensor page used to publish readings as one fixed-layout table.
//! Only that layout is understood here.

pub mod decoder;
pub mod node;
pub mod rows;

pub use decoder::{decode_document, decode_html, decode_table};
pub use node::{parse_document, Element, Node};
