//! Telnet command and option codes, and the option refusal policy.
//!
//! The server implements no telnet options. Every option a peer offers
//! (`WILL`) or asks for (`DO`) is refused with the matching `DONT` / `WONT`,
//! which keeps the peer in plain NVT mode.

use bytes::{BufMut, Bytes, BytesMut};
use std::fmt;

/// Interpret As Command: introduces every telnet control sequence.
pub const IAC: u8 = 255;
/// Peer demands the receiver stop using an option.
pub const DONT: u8 = 254;
/// Peer asks the receiver to use an option.
pub const DO: u8 = 253;
/// Peer refuses to use an option.
pub const WONT: u8 = 252;
/// Peer offers to use an option.
pub const WILL: u8 = 251;
/// Subnegotiation begin.
pub const SB: u8 = 250;
/// Go ahead.
pub const GA: u8 = 249;
/// Erase line.
pub const EL: u8 = 248;
/// Erase character.
pub const EC: u8 = 247;
/// Are you there.
pub const AYT: u8 = 246;
/// Abort output.
pub const AO: u8 = 245;
/// Interrupt process.
pub const IP: u8 = 244;
/// Break.
pub const BRK: u8 = 243;
/// Data mark.
pub const DM: u8 = 242;
/// No operation.
pub const NOP: u8 = 241;
/// Subnegotiation end.
pub const SE: u8 = 240;

/// Option codes seen in the wild from MUD clients.
pub mod opt {
    pub const ECHO: u8 = 1;
    pub const SGA: u8 = 3;
    pub const STATUS: u8 = 5;
    pub const TIMING_MARK: u8 = 6;
    pub const TTYPE: u8 = 24;
    pub const EOR: u8 = 25;
    pub const NAWS: u8 = 31;
    pub const TSPEED: u8 = 32;
    pub const LFLOW: u8 = 33;
    pub const LINEMODE: u8 = 34;
    pub const XDISPLOC: u8 = 35;
    pub const ENVIRON: u8 = 36;
    pub const NEW_ENVIRON: u8 = 39;
    pub const CHARSET: u8 = 42;
    pub const MSDP: u8 = 69;
    pub const MSSP: u8 = 70;
    pub const MCCP2: u8 = 86;
    pub const MSP: u8 = 90;
    pub const MXP: u8 = 91;
    pub const GMCP: u8 = 201;
}

/// Human-readable name of an option code, if it is one we recognize.
pub fn option_name(code: u8) -> Option<&'static str> {
    let name = match code {
        opt::ECHO => "ECHO",
        opt::SGA => "SGA",
        opt::STATUS => "STATUS",
        opt::TIMING_MARK => "TIMING-MARK",
        opt::TTYPE => "TTYPE",
        opt::EOR => "EOR",
        opt::NAWS => "NAWS",
        opt::TSPEED => "TSPEED",
        opt::LFLOW => "LFLOW",
        opt::LINEMODE => "LINEMODE",
        opt::XDISPLOC => "XDISPLOC",
        opt::ENVIRON => "ENVIRON",
        opt::NEW_ENVIRON => "NEW-ENVIRON",
        opt::CHARSET => "CHARSET",
        opt::MSDP => "MSDP",
        opt::MSSP => "MSSP",
        opt::MCCP2 => "MCCP2",
        opt::MSP => "MSP",
        opt::MXP => "MXP",
        opt::GMCP => "GMCP",
        _ => return None,
    };
    Some(name)
}

/// The four option negotiation verbs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Will,
    Wont,
    Do,
    Dont,
}

impl Verb {
    /// Map a command byte to a verb. Returns `None` for non-negotiation bytes.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            WILL => Some(Self::Will),
            WONT => Some(Self::Wont),
            DO => Some(Self::Do),
            DONT => Some(Self::Dont),
            _ => None,
        }
    }

    /// The command byte for this verb.
    pub fn as_byte(self) -> u8 {
        match self {
            Self::Will => WILL,
            Self::Wont => WONT,
            Self::Do => DO,
            Self::Dont => DONT,
        }
    }

    /// The verb we answer with when refusing this one, if any.
    ///
    /// `WILL` is refused with `DONT` and `DO` with `WONT`. A peer that is
    /// already declining gets no answer, otherwise two refusing peers would
    /// loop forever.
    pub fn refusal(self) -> Option<Self> {
        match self {
            Self::Will => Some(Self::Dont),
            Self::Do => Some(Self::Wont),
            Self::Wont | Self::Dont => None,
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Will => "WILL",
            Self::Wont => "WONT",
            Self::Do => "DO",
            Self::Dont => "DONT",
        })
    }
}

/// One decoded `IAC <verb> <option>` sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NegotiationUnit {
    pub verb: Verb,
    pub option: u8,
}

impl NegotiationUnit {
    pub fn new(verb: Verb, option: u8) -> Self {
        Self { verb, option }
    }

    /// The three bytes this unit occupies on the wire.
    pub fn to_bytes(self) -> [u8; 3] {
        [IAC, self.verb.as_byte(), self.option]
    }

    /// True when the peer is proposing something and expects an answer.
    pub fn is_proposal(self) -> bool {
        self.verb.refusal().is_some()
    }
}

impl fmt::Display for NegotiationUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match option_name(self.option) {
            Some(name) => write!(f, "{} {}", self.verb, name),
            None => write!(f, "{} {}", self.verb, self.option),
        }
    }
}

/// Build the refusal for a burst of units.
///
/// Each distinct proposal is refused once, in arrival order. Returns `None`
/// when nothing in the burst needs an answer.
pub fn refuse(units: &[NegotiationUnit]) -> Option<Bytes> {
    let mut out = BytesMut::new();
    for (i, unit) in units.iter().enumerate() {
        let Some(answer) = unit.verb.refusal() else {
            continue;
        };
        if units[..i].contains(unit) {
            continue;
        }
        out.put_slice(&NegotiationUnit::new(answer, unit.option).to_bytes());
    }
    if out.is_empty() {
        None
    } else {
        Some(out.freeze())
    }
}
