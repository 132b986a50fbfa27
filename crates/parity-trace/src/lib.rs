//! Frame traces for wire-level parity testing
//!
//! This crate turns captured log text into ordered frame sequences and
//! compares two sequences direction by direction:
//!
//! - [`extract`] scrapes `SENT_HEX: <hex>` / `RECV_HEX: <hex>` marker lines
//! - [`record`] parses line-delimited JSON frame records
//! - [`compare`] checks ordered equality per direction and renders a diff
//!
//! Everything here is a pure function of its input text; no processes are
//! spawned.
//!
//! # Example
//!
//! ```
//! use parity_trace::{compare, extract, Direction};
//!
//! let reference = extract("SENT_HEX: 7e01\nRECV_HEX: 7e02");
//! let candidate = extract("SENT_HEX: 7E01\nRECV_HEX: 7E02");
//! assert_eq!(reference.hexes(Direction::Sent), vec!["7E01"]);
//! assert!(compare(&reference, &candidate).passed());
//! ```

pub mod compare;
pub mod diff;
mod error;
pub mod extract;
mod frame;
pub mod record;

pub use compare::{compare, Comparison, DirectionComparison};
pub use error::{TraceError, TraceResult};
pub use extract::extract;
pub use frame::{Direction, Frame, FrameSequence};

use serde::{Deserialize, Serialize};
use std::fmt;

/// How frames are encoded in captured output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceFormat {
    /// `SENT_HEX: <hex>` / `RECV_HEX: <hex>` lines in free-form logs
    #[default]
    Markers,
    /// Line-delimited JSON records with sequence numbers
    Records,
}

impl TraceFormat {
    /// Extract frames in this format
    pub fn extract(&self, text: &str) -> TraceResult<FrameSequence> {
        match self {
            TraceFormat::Markers => Ok(extract::extract(text)),
            TraceFormat::Records => record::extract_records(text),
        }
    }

    /// Cheap check for whether `text` carries any frame output at all
    pub fn has_marker(&self, text: &str) -> bool {
        match self {
            TraceFormat::Markers => extract::contains_marker(text),
            TraceFormat::Records => record::contains_record(text),
        }
    }
}

impl fmt::Display for TraceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraceFormat::Markers => f.write_str("markers"),
            TraceFormat::Records => f.write_str("records"),
        }
    }
}
