//! # golem-proto
//!
//! Telnet wire handling for the golem MUD server.
//!
//! ## Features
//!
//! - Telnet command and option constants
//! - A refuse-everything option policy (`WILL` → `DONT`, `DO` → `WONT`)
//! - A bounded line codec for tokio that lifts negotiation out of the text
//!   stream
//!
//! ## Quick Start
//!
//! ```rust
//! use bytes::BytesMut;
//! use golem_proto::{Frame, TelnetCodec};
//! use golem_proto::telnet::{IAC, WILL, DONT, opt};
//! use tokio_util::codec::Decoder;
//!
//! let mut codec = TelnetCodec::new();
//! let mut buf = BytesMut::from(&[IAC, WILL, opt::NAWS][..]);
//! buf.extend_from_slice(b"north\r\n");
//!
//! let negotiation = codec.decode(&mut buf).unwrap().unwrap();
//! assert_eq!(&negotiation.reply().unwrap()[..], &[IAC, DONT, opt::NAWS]);
//!
//! let line = codec.decode(&mut buf).unwrap().unwrap();
//! assert_eq!(line, Frame::Line("north".to_string()));
//! ```

#![deny(clippy::all)]
#![cfg_attr(docsrs, feature(doc_cfg))]

#[cfg(feature = "tokio")]
pub mod codec;
pub mod error;
pub mod telnet;

#[cfg(feature = "tokio")]
pub use self::codec::{Frame, MAX_LINE_LEN, TelnetCodec};
pub use self::error::ProtocolError;
pub use self::telnet::{NegotiationUnit, Verb};
