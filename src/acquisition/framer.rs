//! Line framing for the device byte stream
//!
//! Serial reads deliver arbitrary fragments of the newline-delimited text
//! protocol. [`LineFramer`] reassembles them into complete lines, keeping the
//! unterminated tail in a bounded [`CarryBuffer`] between calls.
//!
//! # Overflow policy
//!
//! When a line would grow beyond the carry capacity the buffer is cleared and
//! a single [`Framed::Overflow`] is emitted. The remainder of that line, up to
//! and including its newline, is dropped since it is truncated; framing
//! resumes with the next complete line. The output is independent of how the
//! stream was split into chunks.

use tracing::warn;

/// Default carry buffer capacity in bytes
pub const DEFAULT_CARRY_CAPACITY: usize = 4096;

/// A trimmed protocol line
pub type RawLine = String;

/// Bounded storage for bytes that do not yet form a complete line.
///
/// Never contains a newline.
#[derive(Debug, Clone)]
pub struct CarryBuffer {
    bytes: Vec<u8>,
    capacity: usize,
}

impl CarryBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity.min(DEFAULT_CARRY_CAPACITY)),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Whether `extra` more bytes can be appended without exceeding capacity
    pub fn fits(&self, extra: usize) -> bool {
        self.bytes.len().saturating_add(extra) <= self.capacity
    }

    fn extend(&mut self, segment: &[u8]) {
        debug_assert!(!segment.contains(&b'\n'));
        self.bytes.extend_from_slice(segment);
    }

    fn take(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.bytes)
    }

    pub fn clear(&mut self) {
        self.bytes.clear();
    }
}

impl Default for CarryBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CARRY_CAPACITY)
    }
}

/// One item produced by [`LineFramer::ingest`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Framed {
    /// A complete, trimmed, non-empty line
    Line(RawLine),
    /// The carry buffer overflowed and was resynchronised
    Overflow,
}

/// Turns an unbounded byte stream into complete lines
#[derive(Debug, Clone, Default)]
pub struct LineFramer {
    carry: CarryBuffer,
    /// Dropping the tail of an overflowed line until its newline arrives
    discarding: bool,
}

impl LineFramer {
    /// Create a framer with the given carry capacity
    pub fn new(capacity: usize) -> Self {
        Self {
            carry: CarryBuffer::new(capacity),
            discarding: false,
        }
    }

    /// Feed a chunk of bytes, returning every line it completes.
    ///
    /// Never blocks. Trailing unterminated data is carried to the next call.
    pub fn ingest(&mut self, bytes: &[u8]) -> Vec<Framed> {
        let mut out = Vec::new();
        let mut rest = bytes;

        while !rest.is_empty() {
            let (segment, terminated, remaining) = match rest.iter().position(|&b| b == b'\n') {
                Some(idx) => (&rest[..idx], true, &rest[idx + 1..]),
                None => (rest, false, &rest[rest.len()..]),
            };
            rest = remaining;
            self.push_segment(segment, terminated, &mut out);
        }

        out
    }

    fn push_segment(&mut self, segment: &[u8], terminated: bool, out: &mut Vec<Framed>) {
        if self.discarding {
            if terminated {
                self.discarding = false;
            }
            return;
        }

        if !self.carry.fits(segment.len()) {
            warn!(
                carried = self.carry.len(),
                incoming = segment.len(),
                capacity = self.carry.capacity(),
                "Carry buffer overflow, resynchronising"
            );
            self.carry.clear();
            self.discarding = !terminated;
            out.push(Framed::Overflow);
            return;
        }

        self.carry.extend(segment);

        if terminated {
            let raw = self.carry.take();
            let line = String::from_utf8_lossy(&raw).trim().to_string();
            if !line.is_empty() {
                out.push(Framed::Line(line));
            }
        }
    }

    /// Number of carried bytes awaiting a newline
    pub fn pending(&self) -> usize {
        self.carry.len()
    }

    /// Whether the framer is skipping the tail of an overflowed line
    pub fn is_resynchronising(&self) -> bool {
        self.discarding
    }

    /// Drop all carried state, e.g. when the device link changes
    pub fn reset(&mut self) {
        self.carry.clear();
        self.discarding = false;
    }
}
