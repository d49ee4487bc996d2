//! Typed messages of the Z21 LAN protocol.
//!
//! - [`Message`]: closed set of variants the client sends or decodes
//! - [`dispatch`]: the header / X-header / DB0 decision tree that turns a
//!   [`Frame`](z21_frame::Frame) into a [`Message`]
//! - [`fingerprint`]: correlation keys that pair a request with its reply
//!
//! The protocol carries no sequence numbers. A reply is matched to a request
//! by the *kind* of message, so every variant declares the identity bytes
//! its kind hashes to, or declares none when it is never awaited.

pub mod dispatch;
pub mod error;
pub mod fingerprint;
pub mod message;
pub mod names;
pub mod variants;
pub mod wire;

pub use dispatch::{classify, decode, Kind};
pub use error::{DecodeError, Result};
pub use fingerprint::{fingerprint, CorrelationKey};
pub use message::{Message, Variant};
pub use variants::{
    BroadcastFlags, BroadcastMask, CanDetector, CanOccupancy, CentralState, CommandStation,
    FirmwareVersion, Hardware, HwInfo, LocoDrive, LocoInfo, LockCode, Logoff, SerialNumber,
    SetBroadcastFlags, Status, Stop, SystemState, TrackPower, Version, XBusProtocol,
};
