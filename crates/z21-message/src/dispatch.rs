//! Decision tree from a received frame to a message variant.
//!
//! The tree has three levels:
//!
//! | Level | Discriminator                   | Example                          |
//! |-------|---------------------------------|----------------------------------|
//! | 0     | frame header                    | `0x1A` → hardware info           |
//! | 1     | X-Bus header (`payload[0]`)     | `0x62` → status changed          |
//! | 2     | `(x_header, db0)` (`payload[1]`)| `(0x61, 0x01)` → track power on  |
//!
//! Each level either selects a variant or descends; an unknown discriminator
//! at any level is an error naming the level that failed.

use serde::Serialize;
use z21_frame::header::{
    DB0_BC_TRACK_POWER_OFF, DB0_BC_TRACK_POWER_ON, DB0_GET_VERSION, LAN_CAN_DETECTOR,
    LAN_GET_BROADCASTFLAGS, LAN_GET_CODE, LAN_GET_HWINFO, LAN_GET_SERIAL_NUMBER, LAN_LOGOFF,
    LAN_SYSTEMSTATE_DATACHANGED, LAN_X, X_61, X_63, X_BC_STOPPED, X_LOCO_INFO, X_STATUS_CHANGED,
};
use z21_frame::Frame;

use crate::error::{DecodeError, Result};
use crate::message::{Message, Variant};
use crate::variants::{
    BroadcastFlags, CanDetector, HwInfo, LocoInfo, LockCode, Logoff, SerialNumber,
    SetBroadcastFlags, Status, Stop, SystemState, TrackPower, Version,
};

/// Message kind selected by the dispatch tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
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
}

impl Kind {
    pub fn name(&self) -> &'static str {
        match self {
            Kind::SerialNumber => "serial_number",
            Kind::LockCode => "lock_code",
            Kind::HwInfo => "hw_info",
            Kind::Logoff => "logoff",
            Kind::SetBroadcastFlags => "set_broadcast_flags",
            Kind::BroadcastFlags => "broadcast_flags",
            Kind::SystemState => "system_state",
            Kind::CanDetector => "can_detector",
            Kind::Status => "status",
            Kind::Stop => "stop",
            Kind::LocoInfo => "loco_info",
            Kind::TrackPower => "track_power",
            Kind::Version => "version",
        }
    }

    /// Parse `payload` as this kind.
    pub fn decode(self, payload: &[u8]) -> Result<Message> {
        let msg = match self {
            Kind::SerialNumber => SerialNumber::decode(payload)?.into(),
            Kind::LockCode => LockCode::decode(payload)?.into(),
            Kind::HwInfo => HwInfo::decode(payload)?.into(),
            Kind::Logoff => Logoff::decode(payload)?.into(),
            Kind::SetBroadcastFlags => SetBroadcastFlags::decode(payload)?.into(),
            Kind::BroadcastFlags => BroadcastFlags::decode(payload)?.into(),
            Kind::SystemState => SystemState::decode(payload)?.into(),
            Kind::CanDetector => CanDetector::decode(payload)?.into(),
            Kind::Status => Status::decode(payload)?.into(),
            Kind::Stop => Stop::decode(payload)?.into(),
            Kind::LocoInfo => LocoInfo::decode(payload)?.into(),
            Kind::TrackPower => TrackPower::decode(payload)?.into(),
            Kind::Version => Version::decode(payload)?.into(),
        };
        Ok(msg)
    }
}

/// Walk the decision tree for `frame` without parsing its fields.
pub fn classify(frame: &Frame) -> Result<Kind> {
    let kind = match frame.header {
        LAN_GET_SERIAL_NUMBER => Kind::SerialNumber,
        LAN_GET_CODE => Kind::LockCode,
        LAN_GET_HWINFO => Kind::HwInfo,
        LAN_LOGOFF => Kind::Logoff,
        LAN_GET_BROADCASTFLAGS => Kind::BroadcastFlags,
        LAN_SYSTEMSTATE_DATACHANGED => Kind::SystemState,
        LAN_CAN_DETECTOR => Kind::CanDetector,
        LAN_X => classify_xbus(&frame.payload)?,
        other => return Err(DecodeError::UnknownHeader(other)),
    };
    Ok(kind)
}

fn classify_xbus(payload: &[u8]) -> Result<Kind> {
    let x_header = *payload.first().ok_or(DecodeError::Truncated)?;
    let kind = match x_header {
        X_61 | X_63 => {
            let db0 = *payload.get(1).ok_or(DecodeError::Truncated)?;
            classify_db0(x_header, db0)?
        }
        X_STATUS_CHANGED => Kind::Status,
        X_BC_STOPPED => Kind::Stop,
        X_LOCO_INFO => Kind::LocoInfo,
        other => return Err(DecodeError::UnknownXHeader(other)),
    };
    Ok(kind)
}

fn classify_db0(x_header: u8, db0: u8) -> Result<Kind> {
    match (x_header, db0) {
        (X_61, DB0_BC_TRACK_POWER_OFF | DB0_BC_TRACK_POWER_ON) => Ok(Kind::TrackPower),
        (X_63, DB0_GET_VERSION) => Ok(Kind::Version),
        _ => Err(DecodeError::UnknownDb0 { x_header, db0 }),
    }
}

/// Decode a received frame into a message.
pub fn decode(frame: &Frame) -> Result<Message> {
    classify(frame)?.decode(&frame.payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn frame(header: u16, payload: &'static [u8]) -> Frame {
        Frame::new(header, Bytes::from_static(payload))
    }

    #[test]
    fn level0_selects_by_header() {
        let msg = decode(&frame(0x10, &[0x39, 0x30, 0x00, 0x00])).unwrap();
        assert_eq!(msg, Message::SerialNumber(SerialNumber { serial: 12345 }));

        let msg = decode(&frame(0x18, &[0x00])).unwrap();
        assert_eq!(msg.kind(), Kind::LockCode);

        assert_eq!(classify(&frame(0x1A, &[])).unwrap(), Kind::HwInfo);
        assert_eq!(classify(&frame(0x84, &[])).unwrap(), Kind::SystemState);
        assert_eq!(classify(&frame(0xC4, &[])).unwrap(), Kind::CanDetector);
    }

    #[test]
    fn hwinfo_reply() {
        let msg = decode(&frame(0x1A, &[0x00, 0x02, 0x00, 0x00, 0x05, 0x01, 0x00, 0x00])).unwrap();
        let Message::HwInfo(info) = msg else {
            panic!("expected hwinfo, got {msg:?}");
        };
        assert_eq!(info.hardware.to_string(), "black Z21 (2012)");
        assert_eq!(info.firmware.map(|f| f.to_string()).as_deref(), Some("1.5"));
    }

    #[test]
    fn level1_selects_by_x_header() {
        assert_eq!(classify(&frame(0x40, &[0x62, 0x22, 0x00, 0x40])).unwrap(), Kind::Status);
        assert_eq!(classify(&frame(0x40, &[0x81, 0x00, 0x81])).unwrap(), Kind::Stop);
        assert_eq!(
            classify(&frame(0x40, &[0xEF, 0x00, 0x03, 0x04, 0x80, 0x00, 0x68])).unwrap(),
            Kind::LocoInfo
        );
    }

    #[test]
    fn level2_selects_by_db0() {
        assert_eq!(
            decode(&frame(0x40, &[0x61, 0x00, 0x61])).unwrap(),
            Message::TrackPower(TrackPower { on: false })
        );
        assert_eq!(
            decode(&frame(0x40, &[0x61, 0x01, 0x60])).unwrap(),
            Message::TrackPower(TrackPower { on: true })
        );
        assert_eq!(
            classify(&frame(0x40, &[0x63, 0x21, 0x30, 0x12, 0x60])).unwrap(),
            Kind::Version
        );
    }

    #[test]
    fn unknown_discriminators_name_their_level() {
        assert_eq!(
            decode(&frame(0x99, &[])),
            Err(DecodeError::UnknownHeader(0x99))
        );
        assert_eq!(
            decode(&frame(0x40, &[0x99])),
            Err(DecodeError::UnknownXHeader(0x99))
        );
        assert_eq!(
            decode(&frame(0x40, &[0x61, 0x99])),
            Err(DecodeError::UnknownDb0 {
                x_header: 0x61,
                db0: 0x99
            })
        );
        assert_eq!(
            decode(&frame(0x40, &[0x63, 0x00])),
            Err(DecodeError::UnknownDb0 {
                x_header: 0x63,
                db0: 0x00
            })
        );
    }

    #[test]
    fn missing_discriminator_is_truncated() {
        assert_eq!(decode(&frame(0x40, &[])), Err(DecodeError::Truncated));
        assert_eq!(decode(&frame(0x40, &[0x61])), Err(DecodeError::Truncated));
        assert_eq!(decode(&frame(0x40, &[0x63])), Err(DecodeError::Truncated));
    }

    #[test]
    fn short_field_layout_is_error_not_panic() {
        assert!(matches!(
            decode(&frame(0x10, &[0x01, 0x02])),
            Err(DecodeError::ShortPayload { .. })
        ));
        assert!(matches!(
            decode(&frame(0x40, &[0x62])),
            Err(DecodeError::ShortPayload { .. })
        ));
    }

    #[test]
    fn decoded_reply_keys_match_request_keys() {
        let pairs: Vec<(Message, Frame)> = vec![
            (SerialNumber::default().into(), frame(0x10, &[0, 0, 0, 0])),
            (LockCode::default().into(), frame(0x18, &[0])),
            (HwInfo::default().into(), frame(0x1A, &[0, 2, 0, 0, 5, 1, 0, 0])),
            (BroadcastFlags::default().into(), frame(0x51, &[1, 0, 0, 0])),
            (
                SystemState::default().into(),
                frame(0x84, &[0; SystemState::LEN]),
            ),
            (Status::default().into(), frame(0x40, &[0x62, 0x22, 0x00, 0x40])),
            (Stop.into(), frame(0x40, &[0x81, 0x00, 0x81])),
            (
                LocoInfo::query(3).into(),
                frame(0x40, &[0xEF, 0x00, 0x03, 0x04, 0x80, 0x00, 0x68]),
            ),
            (TrackPower { on: true }.into(), frame(0x40, &[0x61, 0x01, 0x60])),
            (TrackPower { on: false }.into(), frame(0x40, &[0x61, 0x00, 0x61])),
            (
                Version::default().into(),
                frame(0x40, &[0x63, 0x21, 0x30, 0x12, 0x60]),
            ),
        ];
        for (request, reply) in pairs {
            let decoded = decode(&reply).unwrap();
            assert_eq!(request.key(), decoded.key(), "{}", request.name());
            assert!(request.key().is_some());
        }
    }
}
