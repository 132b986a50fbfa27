//! Marker-based frame extraction from free-form log text
//!
//! Recognizes lines containing `SENT_HEX: <hex>` or `RECV_HEX: <hex>`
//! anywhere in the line, so logger prefixes such as timestamps or test names
//! are tolerated. Everything else is treated as noise.

use crate::frame::{Direction, Frame, FrameSequence};
use regex::Regex;
use std::sync::OnceLock;
use tracing::trace;

/// Literal marker for outbound frames
pub const SENT_MARKER: &str = "SENT_HEX";
/// Literal marker for inbound frames
pub const RECV_MARKER: &str = "RECV_HEX";

const MARKER_PATTERN: &str = r"(?i)(SENT|RECV)_HEX:\s*([0-9A-F]+)";

fn marker_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(MARKER_PATTERN).expect("marker pattern is valid"))
}

/// Whether `text` contains either literal marker substring
pub fn contains_marker(text: &str) -> bool {
    text.contains(SENT_MARKER) || text.contains(RECV_MARKER)
}

/// Extract frames from captured output, in order of appearance
pub fn extract(text: &str) -> FrameSequence {
    let re = marker_regex();
    let mut frames = FrameSequence::new();

    for (index, line) in text.lines().enumerate() {
        let Some(caps) = re.captures(line) else {
            continue;
        };

        let direction = if caps[1].eq_ignore_ascii_case("SENT") {
            Direction::Sent
        } else {
            Direction::Recv
        };

        // The pattern only admits hex digits, so construction cannot fail.
        if let Ok(frame) = Frame::new(direction, &caps[2]) {
            trace!("line {}: {}", index + 1, frame);
            frames.push(frame);
        }
    }

    frames
}
