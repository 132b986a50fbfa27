//! Structured frame records
//!
//! An alternative to marker scraping: each frame is one JSON object per line,
//!
//! ```text
//! {"version":1,"seq":0,"direction":"SENT","payload":"7E01"}
//! ```
//!
//! Lines that are not JSON objects carrying a `direction` field are log noise.
//! Lines that are records must be well formed, and their `seq` numbers must
//! count up from zero without gaps.

use crate::error::{TraceError, TraceResult};
use crate::frame::{Direction, Frame, FrameSequence};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::trace;

/// Record schema version understood by this parser
pub const RECORD_VERSION: u32 = 1;

/// One structured frame record as it appears on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameRecord {
    pub version: u32,
    pub seq: u64,
    pub direction: String,
    pub payload: String,
}

impl FrameRecord {
    /// Build a record for `frame` at position `seq`
    pub fn from_frame(seq: u64, frame: &Frame) -> Self {
        Self {
            version: RECORD_VERSION,
            seq,
            direction: frame.direction().to_string(),
            payload: frame.hex().to_string(),
        }
    }
}

/// Parse a single line; `Ok(None)` means the line is not a record
fn parse_line(line_no: usize, line: &str) -> TraceResult<Option<FrameRecord>> {
    let trimmed = line.trim();
    if !trimmed.starts_with('{') {
        return Ok(None);
    }

    let value: Value = match serde_json::from_str(trimmed) {
        Ok(value) => value,
        Err(_) => return Ok(None),
    };
    if value.get("direction").is_none() {
        return Ok(None);
    }

    serde_json::from_value(value)
        .map(Some)
        .map_err(|e| TraceError::MalformedRecord {
            line: line_no,
            reason: e.to_string(),
        })
}

/// Whether any line of `text` is a frame record
pub fn contains_record(text: &str) -> bool {
    text.lines()
        .enumerate()
        .any(|(i, line)| matches!(parse_line(i + 1, line), Ok(Some(_))))
}

/// Extract frames from line-delimited records
pub fn extract_records(text: &str) -> TraceResult<FrameSequence> {
    let mut frames = FrameSequence::new();
    let mut expected_seq = 0u64;

    for (index, line) in text.lines().enumerate() {
        let line_no = index + 1;
        let Some(record) = parse_line(line_no, line)? else {
            continue;
        };

        if record.version != RECORD_VERSION {
            return Err(TraceError::UnsupportedVersion {
                line: line_no,
                version: record.version,
            });
        }
        if record.seq != expected_seq {
            return Err(TraceError::SequenceGap {
                line: line_no,
                expected: expected_seq,
                found: record.seq,
            });
        }

        let direction: Direction = record.direction.parse()?;
        let frame = Frame::new(direction, &record.payload)?;
        trace!("record {}: {}", record.seq, frame);
        frames.push(frame);
        expected_seq += 1;
    }

    Ok(frames)
}
