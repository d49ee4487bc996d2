//! Concrete message layouts.
//!
//! [`lan`] holds the variants with their own frame header; [`xbus`] holds the
//! ones carried inside `LAN_X` frames.

pub mod lan;
pub mod xbus;

pub use lan::{
    BroadcastFlags, BroadcastMask, CanDetector, CanOccupancy, FirmwareVersion, Hardware, HwInfo,
    LockCode, Logoff, SerialNumber, SetBroadcastFlags, SystemState,
};
pub use xbus::{
    CentralState, CommandStation, LocoDrive, LocoInfo, Status, Stop, TrackPower, Version,
    XBusProtocol,
};
