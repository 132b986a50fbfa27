//! Frame data model

use crate::error::{TraceError, TraceResult};
use std::fmt;
use std::str::FromStr;

/// Direction of a frame relative to the implementation under test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Outbound frame
    Sent,
    /// Inbound frame
    Recv,
}

impl Direction {
    /// Both directions, in reporting order
    pub const ALL: [Direction; 2] = [Direction::Sent, Direction::Recv];

    /// Uppercase label used in markers and reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Sent => "SENT",
            Direction::Recv => "RECV",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = TraceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("SENT") {
            Ok(Direction::Sent)
        } else if s.eq_ignore_ascii_case("RECV") {
            Ok(Direction::Recv)
        } else {
            Err(TraceError::InvalidDirection {
                value: s.to_string(),
            })
        }
    }
}

/// One payload crossing the wire, hex encoded
///
/// The payload is always non-empty, hex digits only, uppercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Frame {
    direction: Direction,
    hex: String,
}

impl Frame {
    /// Create a frame, validating and uppercasing the payload
    pub fn new(direction: Direction, hex: impl AsRef<str>) -> TraceResult<Self> {
        let hex = hex.as_ref();
        if hex.is_empty() || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(TraceError::InvalidHex {
                payload: hex.to_string(),
            });
        }

        Ok(Self {
            direction,
            hex: hex.to_ascii_uppercase(),
        })
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn hex(&self) -> &str {
        &self.hex
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_HEX: {}", self.direction, self.hex)
    }
}

/// Frames in order of appearance, both directions mixed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameSequence {
    frames: Vec<Frame>,
}

impl FrameSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Frame> {
        self.frames.iter()
    }

    /// Number of frames travelling in `direction`
    pub fn count(&self, direction: Direction) -> usize {
        self.frames
            .iter()
            .filter(|f| f.direction == direction)
            .count()
    }

    /// Payloads for one direction, keeping their relative order
    pub fn hexes(&self, direction: Direction) -> Vec<&str> {
        self.frames
            .iter()
            .filter(|f| f.direction == direction)
            .map(Frame::hex)
            .collect()
    }

    /// Partition into (SENT, RECV) sequences, each keeping relative order
    pub fn split(&self) -> (FrameSequence, FrameSequence) {
        let (sent, recv): (Vec<Frame>, Vec<Frame>) = self
            .frames
            .iter()
            .cloned()
            .partition(|f| f.direction == Direction::Sent);
        (Self::from(sent), Self::from(recv))
    }
}

impl From<Vec<Frame>> for FrameSequence {
    fn from(frames: Vec<Frame>) -> Self {
        Self { frames }
    }
}

impl FromIterator<Frame> for FrameSequence {
    fn from_iter<I: IntoIterator<Item = Frame>>(iter: I) -> Self {
        Self {
            frames: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for FrameSequence {
    type Item = Frame;
    type IntoIter = std::vec::IntoIter<Frame>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.into_iter()
    }
}

impl<'a> IntoIterator for &'a FrameSequence {
    type Item = &'a Frame;
    type IntoIter = std::slice::Iter<'a, Frame>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.iter()
    }
}
