use std::fmt;

use bytes::{BufMut, BytesMut};
use serde::{Serialize, Serializer};
use z21_frame::header::{
    DB0_GET_LOCO_INFO, DB0_GET_STATUS, DB0_GET_VERSION, DB0_SET_TRACK_POWER_OFF,
    DB0_SET_TRACK_POWER_ON, LAN_X, X_21, X_61, X_BC_STOPPED, X_E3, X_LOCO_INFO,
    X_SET_STOP, X_STATUS_CHANGED,
};

use crate::error::Result;
use crate::message::Variant;
use crate::names::command_station_name;
use crate::wire::PayloadReader;

const LAN_X_BYTE: u8 = LAN_X as u8;

/// Append `bytes` followed by their XOR checksum.
fn put_with_xor(dst: &mut BytesMut, bytes: &[u8]) {
    dst.put_slice(bytes);
    dst.put_u8(bytes.iter().fold(0, |acc, b| acc ^ b));
}

/// Central state bitmask shared by `LAN_X_STATUS_CHANGED` and the system
/// state block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct CentralState(pub u8);

impl CentralState {
    pub const EMERGENCY_STOP: u8 = 0x01;
    pub const TRACK_VOLTAGE_OFF: u8 = 0x02;
    pub const SHORT_CIRCUIT: u8 = 0x04;
    pub const PROGRAMMING_MODE_ACTIVE: u8 = 0x20;

    pub fn has(&self, flag: u8) -> bool {
        self.0 & flag != 0
    }

    /// Names of the set flags, in bit order.
    pub fn flag_names(&self) -> Vec<&'static str> {
        [
            (Self::EMERGENCY_STOP, "emergency stop"),
            (Self::TRACK_VOLTAGE_OFF, "track voltage off"),
            (Self::SHORT_CIRCUIT, "short circuit"),
            (Self::PROGRAMMING_MODE_ACTIVE, "programming mode"),
        ]
        .into_iter()
        .filter(|(bit, _)| self.has(*bit))
        .map(|(_, name)| name)
        .collect()
    }
}

/// `LAN_X_GET_STATUS`, answered by `LAN_X_STATUS_CHANGED`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Status {
    pub state: CentralState,
}

impl Variant for Status {
    const HEADER: u16 = LAN_X;

    fn encode(&self, dst: &mut BytesMut) {
        put_with_xor(dst, &[X_21, DB0_GET_STATUS]);
    }

    fn decode(payload: &[u8]) -> Result<Self> {
        let mut r = PayloadReader::new(payload);
        r.skip(2)?;
        Ok(Self {
            state: CentralState(r.read_u8()?),
        })
    }

    fn identity(&self) -> Option<&'static [u8]> {
        Some(&[LAN_X_BYTE, X_STATUS_CHANGED])
    }
}

/// `LAN_X_SET_STOP`, acknowledged by the `LAN_X_BC_STOPPED` broadcast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Stop;

impl Variant for Stop {
    const HEADER: u16 = LAN_X;

    fn encode(&self, dst: &mut BytesMut) {
        put_with_xor(dst, &[X_SET_STOP]);
    }

    fn decode(_payload: &[u8]) -> Result<Self> {
        Ok(Self)
    }

    fn identity(&self) -> Option<&'static [u8]> {
        Some(&[LAN_X_BYTE, X_BC_STOPPED])
    }
}

/// Driving state reported in a `LAN_X_LOCO_INFO` reply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LocoDrive {
    /// Another client is controlling the loco.
    pub busy: bool,
    /// 14, 28 or 128.
    pub speed_steps: u8,
    pub forward: bool,
    pub speed: u8,
    /// F0.
    pub light: bool,
    /// F1..F4 in bits 0..4.
    pub functions: u8,
}

impl LocoDrive {
    fn decode(r: &mut PayloadReader<'_>) -> Result<Self> {
        let db2 = r.read_u8()?;
        let db3 = r.read_u8()?;
        let db4 = r.read_u8()?;
        let speed_steps = match db2 & 0x07 {
            0 => 14,
            2 => 28,
            _ => 128,
        };
        Ok(Self {
            busy: db2 & 0x08 != 0,
            speed_steps,
            forward: db3 & 0x80 != 0,
            speed: db3 & 0x7F,
            light: db4 & 0x10 != 0,
            functions: db4 & 0x0F,
        })
    }
}

/// `LAN_X_GET_LOCO_INFO`, answered by `LAN_X_LOCO_INFO`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LocoInfo {
    pub address: u16,
    /// Present on replies.
    pub drive: Option<LocoDrive>,
}

impl Default for LocoInfo {
    fn default() -> Self {
        Self::query(1)
    }
}

impl LocoInfo {
    pub fn query(address: u16) -> Self {
        Self {
            address,
            drive: None,
        }
    }
}

impl Variant for LocoInfo {
    const HEADER: u16 = LAN_X;

    fn encode(&self, dst: &mut BytesMut) {
        // Long addresses carry 0xC0 in the high byte.
        let msb = if self.address >= 128 {
            0xC0 | (self.address >> 8) as u8
        } else {
            0x00
        };
        put_with_xor(dst, &[X_E3, DB0_GET_LOCO_INFO, msb, self.address as u8]);
    }

    fn decode(payload: &[u8]) -> Result<Self> {
        let mut r = PayloadReader::new(payload);
        r.skip(1)?;
        let msb = r.read_u8()?;
        let lsb = r.read_u8()?;
        let address = (u16::from(msb & 0x3F) << 8) | u16::from(lsb);
        let drive = LocoDrive::decode(&mut r)?;
        Ok(Self {
            address,
            drive: Some(drive),
        })
    }

    fn identity(&self) -> Option<&'static [u8]> {
        Some(&[LAN_X_BYTE, X_LOCO_INFO])
    }
}

/// `LAN_X_SET_TRACK_POWER_ON`/`_OFF`, acknowledged by the matching
/// `LAN_X_BC_TRACK_POWER_*` broadcast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TrackPower {
    pub on: bool,
}

impl Variant for TrackPower {
    const HEADER: u16 = LAN_X;

    fn encode(&self, dst: &mut BytesMut) {
        let db0 = if self.on {
            DB0_SET_TRACK_POWER_ON
        } else {
            DB0_SET_TRACK_POWER_OFF
        };
        put_with_xor(dst, &[X_21, db0]);
    }

    fn decode(payload: &[u8]) -> Result<Self> {
        let mut r = PayloadReader::new(payload);
        r.skip(1)?;
        Ok(Self {
            on: r.read_u8()? != 0,
        })
    }

    fn identity(&self) -> Option<&'static [u8]> {
        if self.on {
            Some(&[LAN_X_BYTE, X_61, 0x01])
        } else {
            Some(&[LAN_X_BYTE, X_61, 0x00])
        }
    }
}

/// X-Bus protocol version, one BCD-style nibble per component.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct XBusProtocol(pub u8);

impl fmt::Display for XBusProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "V{}.{}", self.0 >> 4, self.0 & 0x0F)
    }
}

impl Serialize for XBusProtocol {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Command station identity from `LAN_X_GET_VERSION`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CommandStation {
    pub id: u8,
    pub name: Option<&'static str>,
}

impl CommandStation {
    pub fn from_id(id: u8) -> Self {
        Self {
            id,
            name: command_station_name(id),
        }
    }
}

impl fmt::Display for CommandStation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name {
            Some(name) => f.write_str(name),
            None => write!(f, "0x{:02x}", self.id),
        }
    }
}

/// `LAN_X_GET_VERSION` request and reply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Version {
    pub xbus_protocol: XBusProtocol,
    pub station: CommandStation,
}

impl Variant for Version {
    const HEADER: u16 = LAN_X;

    fn encode(&self, dst: &mut BytesMut) {
        put_with_xor(dst, &[X_21, DB0_GET_VERSION]);
    }

    fn decode(payload: &[u8]) -> Result<Self> {
        let mut r = PayloadReader::new(payload);
        r.skip(2)?;
        let xbus_protocol = XBusProtocol(r.read_u8()?);
        let station = CommandStation::from_id(r.read_u8()?);
        Ok(Self {
            xbus_protocol,
            station,
        })
    }

    fn identity(&self) -> Option<&'static [u8]> {
        Some(&[LAN_X_BYTE, DB0_GET_VERSION])
    }
}
