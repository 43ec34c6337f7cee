//! Firehose-style XML command documents.
//!
//! Converts between the partition table and the `<data>` documents each
//! command type needs, and holds the static templates for the remaining
//! command types.

mod error;
mod parser;
mod templates;
mod writer;

pub use error::XmlError;
pub use parser::*;
pub use templates::*;
pub use writer::*;
