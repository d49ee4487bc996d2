use bytes::{Bytes, BytesMut};
use serde::Serialize;
use z21_frame::{encode_frame, Frame};

use crate::dispatch::Kind;
use crate::error::Result;
use crate::fingerprint::{fingerprint, CorrelationKey};
use crate::variants::{
    BroadcastFlags, CanDetector, HwInfo, LocoInfo, LockCode, Logoff, SerialNumber,
    SetBroadcastFlags, Status, Stop, SystemState, TrackPower, Version,
};

/// One concrete message layout.
pub trait Variant: Sized {
    /// Frame header the variant is sent under.
    const HEADER: u16;

    /// Append the payload bytes the station expects.
    fn encode(&self, dst: &mut BytesMut);

    /// Parse a payload of this variant.
    fn decode(payload: &[u8]) -> Result<Self>;

    /// Identity bytes of this message's kind, or `None` if replies to it are
    /// never awaited.
    fn identity(&self) -> Option<&'static [u8]>;
}

/// Every message the client sends or decodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    SerialNumber(SerialNumber),
    LockCode(LockCode),
    HwInfo(HwInfo),
    Logoff(Logoff),
    SetBroadcastFlags(SetBroadcastFlags),
    BroadcastFlags(BroadcastFlags),
    SystemState(SystemState),
    CanDetector(CanDetector),
    Status(Status),
    Stop(Stop),
    LocoInfo(LocoInfo),
    TrackPower(TrackPower),
    Version(Version),
}

macro_rules! each_variant {
    ($msg:expr, $v:ident => $body:expr) => {
        match $msg {
            Message::SerialNumber($v) => $body,
            Message::LockCode($v) => $body,
            Message::HwInfo($v) => $body,
            Message::Logoff($v) => $body,
            Message::SetBroadcastFlags($v) => $body,
            Message::BroadcastFlags($v) => $body,
            Message::SystemState($v) => $body,
            Message::CanDetector($v) => $body,
            Message::Status($v) => $body,
            Message::Stop($v) => $body,
            Message::LocoInfo($v) => $body,
            Message::TrackPower($v) => $body,
            Message::Version($v) => $body,
        }
    };
}

fn header_of<V: Variant>(_: &V) -> u16 {
    V::HEADER
}

impl Message {
    /// Frame header this message is sent under.
    pub fn header(&self) -> u16 {
        each_variant!(self, v => header_of(v))
    }

    /// Append this message's payload to `dst`.
    pub fn encode(&self, dst: &mut BytesMut) {
        each_variant!(self, v => v.encode(dst))
    }

    /// This message's payload bytes.
    pub fn payload(&self) -> Bytes {
        let mut dst = BytesMut::new();
        self.encode(&mut dst);
        dst.freeze()
    }

    /// Wrap this message in a frame.
    pub fn to_frame(&self) -> Frame {
        Frame::new(self.header(), self.payload())
    }

    /// Encode this message as a complete frame into `dst`.
    pub fn encode_frame(&self, dst: &mut BytesMut) -> z21_frame::Result<()> {
        encode_frame(self.header(), &self.payload(), dst)
    }

    /// Correlation key, or `None` for fire-and-forget messages.
    pub fn key(&self) -> Option<CorrelationKey> {
        each_variant!(self, v => v.identity()).map(fingerprint)
    }

    /// Kind of this message, as selected by the dispatch tree.
    pub fn kind(&self) -> Kind {
        match self {
            Message::SerialNumber(_) => Kind::SerialNumber,
            Message::LockCode(_) => Kind::LockCode,
            Message::HwInfo(_) => Kind::HwInfo,
            Message::Logoff(_) => Kind::Logoff,
            Message::SetBroadcastFlags(_) => Kind::SetBroadcastFlags,
            Message::BroadcastFlags(_) => Kind::BroadcastFlags,
            Message::SystemState(_) => Kind::SystemState,
            Message::CanDetector(_) => Kind::CanDetector,
            Message::Status(_) => Kind::Status,
            Message::Stop(_) => Kind::Stop,
            Message::LocoInfo(_) => Kind::LocoInfo,
            Message::TrackPower(_) => Kind::TrackPower,
            Message::Version(_) => Kind::Version,
        }
    }

    /// Short name for log lines.
    pub fn name(&self) -> &'static str {
        self.kind().name()
    }
}

macro_rules! impl_from_variant {
    ($($variant:ident),* $(,)?) => {
        $(
            impl From<$variant> for Message {
                fn from(v: $variant) -> Self {
                    Message::$variant(v)
                }
            }
        )*
    };
}

impl_from_variant!(
    SerialNumber,
    LockCode,
    HwInfo,
    Logoff,
    SetBroadcastFlags,
    BroadcastFlags,
    SystemState,
    CanDetector,
    Status,
    Stop,
    LocoInfo,
    TrackPower,
    Version,
);
