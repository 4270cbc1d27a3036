//! Telnet framing codec for tokio.
//!
//! Splits an inbound byte stream into text lines and bursts of option
//! negotiation. Control sequences may arrive anywhere, including in the
//! middle of a line; they are lifted out and the surrounding text is joined.

use bytes::{Buf, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::{debug, trace};

use crate::error::{ProtocolError, Result};
use crate::telnet::{self, IAC, NegotiationUnit, SB, SE, Verb};

/// Longest line accepted, terminator included.
pub const MAX_LINE_LEN: usize = 512;

/// One decoded unit of inbound traffic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A complete text line, terminator stripped.
    Line(String),
    /// A run of consecutive negotiation sequences.
    Negotiation(Vec<NegotiationUnit>),
}

impl Frame {
    /// Bytes that must be sent back to the peer for this frame, if any.
    pub fn reply(&self) -> Option<Bytes> {
        match self {
            Frame::Line(_) => None,
            Frame::Negotiation(units) => telnet::refuse(units),
        }
    }
}

/// A control sequence found at the head of the buffer.
#[derive(Debug, PartialEq, Eq)]
enum Sequence {
    Negotiation(NegotiationUnit),
    /// `IAC IAC`, a literal 0xFF data byte.
    Escaped,
    /// Two-byte command such as `NOP` or `AYT`.
    Command(u8),
    /// `IAC SB <option> ... IAC SE`, skipped whole.
    Subnegotiation(Option<u8>),
    /// A byte after `IAC` that is not a telnet command.
    Unknown(u8),
}

/// Scan the control sequence starting at `buf[0] == IAC`.
///
/// Returns the sequence and the number of bytes it spans, or `None` when
/// the sequence is not complete yet.
fn scan_sequence(buf: &[u8]) -> Option<(Sequence, usize)> {
    let command = *buf.get(1)?;
    if command == IAC {
        return Some((Sequence::Escaped, 2));
    }
    if let Some(verb) = Verb::from_byte(command) {
        let option = *buf.get(2)?;
        return Some((Sequence::Negotiation(NegotiationUnit::new(verb, option)), 3));
    }
    if command == SB {
        let mut i = 2;
        while i + 1 < buf.len() {
            if buf[i] == IAC {
                if buf[i + 1] == SE {
                    return Some((Sequence::Subnegotiation(buf.get(2).copied()), i + 2));
                }
                i += 2;
            } else {
                i += 1;
            }
        }
        return None;
    }
    if command >= SE {
        return Some((Sequence::Command(command), 2));
    }
    Some((Sequence::Unknown(command), 2))
}

/// Telnet codec producing [`Frame`]s.
///
/// Lines are bounded: by default a line may hold at most 512 bytes including
/// its LF. A peer that exceeds the bound gets [`ProtocolError::LineTooLong`]
/// instead of an ever-growing buffer.
#[derive(Debug)]
pub struct TelnetCodec {
    /// Data bytes of the current, unterminated line.
    line: Vec<u8>,
    /// Negotiation units decoded since the last data byte.
    burst: Vec<NegotiationUnit>,
    max_len: usize,
}

impl TelnetCodec {
    /// Create a codec with the standard 512-byte line limit.
    pub fn new() -> Self {
        Self::with_max_len(MAX_LINE_LEN)
    }

    /// Create a codec with a custom line limit.
    pub fn with_max_len(max_len: usize) -> Self {
        Self {
            line: Vec::with_capacity(max_len),
            burst: Vec::new(),
            max_len,
        }
    }

    /// The configured line limit.
    pub fn max_len(&self) -> usize {
        self.max_len
    }

    fn take_burst(&mut self) -> Option<Frame> {
        if self.burst.is_empty() {
            None
        } else {
            Some(Frame::Negotiation(std::mem::take(&mut self.burst)))
        }
    }

    fn too_long(&self, actual: usize) -> ProtocolError {
        ProtocolError::LineTooLong {
            actual,
            limit: self.max_len,
        }
    }

    fn apply(&mut self, seq: Sequence) -> Result<()> {
        match seq {
            Sequence::Negotiation(unit) => {
                trace!(%unit, "telnet negotiation");
                if telnet::option_name(unit.option).is_none() {
                    debug!(verb = %unit.verb, option = unit.option, "unknown telnet option");
                }
                self.burst.push(unit);
            }
            Sequence::Escaped => {
                if self.line.len() + 1 >= self.max_len {
                    return Err(self.too_long(self.line.len() + 1));
                }
                self.line.push(IAC);
            }
            Sequence::Command(command) => {
                debug!(command, "ignoring telnet command");
            }
            Sequence::Subnegotiation(option) => {
                debug!(?option, "ignoring telnet subnegotiation");
            }
            Sequence::Unknown(command) => {
                debug!(command, "skipping unknown telnet command");
            }
        }
        Ok(())
    }

    fn finish_line(&mut self) -> String {
        let mut end = self.line.len();
        while end > 0 && matches!(self.line[end - 1], b'\r' | b'\0') {
            end -= 1;
        }
        let text = String::from_utf8_lossy(&self.line[..end]).into_owned();
        self.line.clear();
        text
    }
}

impl Default for TelnetCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for TelnetCodec {
    type Item = Frame;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Frame>> {
        loop {
            let Some(&first) = src.first() else {
                return Ok(self.take_burst());
            };

            if first == IAC {
                match scan_sequence(src) {
                    Some((seq, used)) => {
                        src.advance(used);
                        self.apply(seq)?;
                        continue;
                    }
                    None => {
                        // Truncated sequence: wait for the rest, within bounds.
                        if src.len() > self.max_len {
                            return Err(self.too_long(src.len()));
                        }
                        return Ok(self.take_burst());
                    }
                }
            }

            // Data ends the current negotiation burst.
            if let Some(frame) = self.take_burst() {
                return Ok(Some(frame));
            }

            let stop = src
                .iter()
                .position(|&b| b == IAC || b == b'\n')
                .unwrap_or(src.len());
            let terminated = src.get(stop) == Some(&b'\n');
            let needed = self.line.len() + stop + usize::from(terminated);
            if needed > self.max_len || (!terminated && needed >= self.max_len) {
                return Err(self.too_long(needed));
            }

            self.line.extend_from_slice(&src[..stop]);
            src.advance(stop + usize::from(terminated));
            if terminated {
                return Ok(Some(Frame::Line(self.finish_line())));
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Frame>> {
        if let Some(frame) = self.decode(src)? {
            return Ok(Some(frame));
        }
        if !src.is_empty() || !self.line.is_empty() {
            trace!(
                buffered = src.len(),
                partial = self.line.len(),
                "discarding unterminated input at end of stream"
            );
            src.clear();
            self.line.clear();
        }
        Ok(None)
    }
}

impl Encoder<Bytes> for TelnetCodec {
    type Error = ProtocolError;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<()> {
        dst.extend_from_slice(&item);
        Ok(())
    }
}
