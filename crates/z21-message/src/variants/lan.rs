use std::fmt;

use bytes::{BufMut, BytesMut};
use serde::{Serialize, Serializer};
use z21_frame::header::{
    LAN_CAN_DETECTOR, LAN_GET_BROADCASTFLAGS, LAN_GET_CODE, LAN_GET_HWINFO,
    LAN_GET_SERIAL_NUMBER, LAN_LOGOFF, LAN_SET_BROADCASTFLAGS, LAN_SYSTEMSTATE_DATACHANGED,
    LAN_SYSTEMSTATE_GETDATA,
};

use crate::error::Result;
use crate::message::Variant;
use crate::names::hardware_name;
use crate::variants::xbus::CentralState;
use crate::wire::{decode_bcd, PayloadReader};

/// `LAN_GET_SERIAL_NUMBER` request and reply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SerialNumber {
    pub serial: u32,
}

impl Variant for SerialNumber {
    const HEADER: u16 = LAN_GET_SERIAL_NUMBER;

    fn encode(&self, _dst: &mut BytesMut) {}

    fn decode(payload: &[u8]) -> Result<Self> {
        let serial = PayloadReader::new(payload).read_u32_le()?;
        Ok(Self { serial })
    }

    fn identity(&self) -> Option<&'static [u8]> {
        Some(&[LAN_GET_SERIAL_NUMBER as u8])
    }
}

/// `LAN_GET_CODE` request and reply: the station's feature lock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LockCode {
    pub code: u8,
}

impl LockCode {
    /// All features enabled.
    pub const NO_LOCK: u8 = 0x00;
    /// "z21 start": driving and switching over LAN locked.
    pub const START_LOCKED: u8 = 0x01;
    /// "z21 start": unlocked by activation code.
    pub const START_UNLOCKED: u8 = 0x02;

    pub fn describe(&self) -> &'static str {
        match self.code {
            Self::NO_LOCK => "no lock",
            Self::START_LOCKED => "start locked",
            Self::START_UNLOCKED => "start unlocked",
            _ => "unknown",
        }
    }
}

impl Variant for LockCode {
    const HEADER: u16 = LAN_GET_CODE;

    fn encode(&self, _dst: &mut BytesMut) {}

    fn decode(payload: &[u8]) -> Result<Self> {
        let code = PayloadReader::new(payload).read_u8()?;
        Ok(Self { code })
    }

    fn identity(&self) -> Option<&'static [u8]> {
        Some(&[LAN_GET_CODE as u8])
    }
}

/// Hardware type reported by the station.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Hardware {
    pub id: u32,
    pub name: Option<&'static str>,
}

impl Hardware {
    pub fn from_id(id: u32) -> Self {
        Self {
            id,
            name: hardware_name(id),
        }
    }
}

impl fmt::Display for Hardware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name {
            Some(name) => f.write_str(name),
            None => write!(f, "0x{:02x}", self.id),
        }
    }
}

/// Firmware version decoded from two BCD bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FirmwareVersion {
    pub major: u8,
    pub minor: u8,
}

impl FirmwareVersion {
    /// Decode the low 16 bits of the firmware word: major BCD in bits 8..16,
    /// minor BCD in bits 0..8.
    pub fn from_word(word: u32) -> Option<Self> {
        let major = decode_bcd((word >> 8) as u8)?;
        let minor = decode_bcd(word as u8)?;
        Some(Self { major, minor })
    }
}

impl fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl Serialize for FirmwareVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// `LAN_GET_HWINFO` request and reply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HwInfo {
    pub hardware: Hardware,
    /// `None` when the firmware word is not valid BCD.
    pub firmware: Option<FirmwareVersion>,
}

impl Variant for HwInfo {
    const HEADER: u16 = LAN_GET_HWINFO;

    fn encode(&self, _dst: &mut BytesMut) {}

    fn decode(payload: &[u8]) -> Result<Self> {
        let mut r = PayloadReader::new(payload);
        let hardware = Hardware::from_id(r.read_u32_le()?);
        let firmware = FirmwareVersion::from_word(r.read_u32_le()?);
        Ok(Self { hardware, firmware })
    }

    fn identity(&self) -> Option<&'static [u8]> {
        Some(&[LAN_GET_HWINFO as u8])
    }
}

/// `LAN_LOGOFF`: ends the client's session. Never answered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Logoff;

impl Variant for Logoff {
    const HEADER: u16 = LAN_LOGOFF;

    fn encode(&self, _dst: &mut BytesMut) {}

    fn decode(_payload: &[u8]) -> Result<Self> {
        Ok(Self)
    }

    fn identity(&self) -> Option<&'static [u8]> {
        None
    }
}

/// Broadcast subscription bits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct BroadcastMask(pub u32);

impl BroadcastMask {
    pub const TRACK_UPDATES: u32 = 0x0000_0001;
    pub const FEEDBACK_UPDATES: u32 = 0x0000_0002;
    pub const RAILCOM_SUB_UPDATES: u32 = 0x0000_0004;
    pub const FAST_CLOCK_UPDATES: u32 = 0x0000_0010;
    pub const SYSTEM_UPDATES: u32 = 0x0000_0100;
    pub const LOCO_UPDATES: u32 = 0x0001_0000;
    pub const CAN_BOOSTER_UPDATES: u32 = 0x0002_0000;
    pub const RAILCOM_UPDATES: u32 = 0x0004_0000;
    pub const CAN_DETECTOR_UPDATES: u32 = 0x0008_0000;
    pub const LOCONET_UPDATES: u32 = 0x0100_0000;
    pub const LOCONET_LOCO_UPDATES: u32 = 0x0200_0000;
    pub const LOCONET_SWITCH_UPDATES: u32 = 0x0400_0000;
    pub const LOCONET_DETECTOR_UPDATES: u32 = 0x0800_0000;

    const NAMES: [(u32, &'static str); 13] = [
        (Self::TRACK_UPDATES, "track"),
        (Self::FEEDBACK_UPDATES, "feedback"),
        (Self::RAILCOM_SUB_UPDATES, "railcom-sub"),
        (Self::FAST_CLOCK_UPDATES, "fast-clock"),
        (Self::SYSTEM_UPDATES, "system"),
        (Self::LOCO_UPDATES, "loco"),
        (Self::CAN_BOOSTER_UPDATES, "can-booster"),
        (Self::RAILCOM_UPDATES, "railcom"),
        (Self::CAN_DETECTOR_UPDATES, "can-detector"),
        (Self::LOCONET_UPDATES, "loconet"),
        (Self::LOCONET_LOCO_UPDATES, "loconet-loco"),
        (Self::LOCONET_SWITCH_UPDATES, "loconet-switch"),
        (Self::LOCONET_DETECTOR_UPDATES, "loconet-detector"),
    ];

    pub fn has(&self, flag: u32) -> bool {
        self.0 & flag != 0
    }

    /// Short names of the set flags, lowest bit first.
    pub fn flag_names(&self) -> Vec<&'static str> {
        Self::NAMES
            .iter()
            .filter(|(bit, _)| self.has(*bit))
            .map(|(_, name)| *name)
            .collect()
    }

    /// Flag bit for a short name as returned by [`flag_names`](Self::flag_names).
    pub fn flag_by_name(name: &str) -> Option<u32> {
        Self::NAMES
            .iter()
            .find(|(_, n)| n.eq_ignore_ascii_case(name))
            .map(|(bit, _)| *bit)
    }
}

/// `LAN_SET_BROADCASTFLAGS`: choose which broadcasts the station sends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SetBroadcastFlags {
    pub flags: BroadcastMask,
}

impl Variant for SetBroadcastFlags {
    const HEADER: u16 = LAN_SET_BROADCASTFLAGS;

    fn encode(&self, dst: &mut BytesMut) {
        dst.put_u32_le(self.flags.0);
    }

    fn decode(payload: &[u8]) -> Result<Self> {
        let flags = BroadcastMask(PayloadReader::new(payload).read_u32_le()?);
        Ok(Self { flags })
    }

    fn identity(&self) -> Option<&'static [u8]> {
        None
    }
}

/// `LAN_GET_BROADCASTFLAGS` request and reply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BroadcastFlags {
    pub flags: BroadcastMask,
}

impl Variant for BroadcastFlags {
    const HEADER: u16 = LAN_GET_BROADCASTFLAGS;

    fn encode(&self, _dst: &mut BytesMut) {}

    fn decode(payload: &[u8]) -> Result<Self> {
        let flags = BroadcastMask(PayloadReader::new(payload).read_u32_le()?);
        Ok(Self { flags })
    }

    fn identity(&self) -> Option<&'static [u8]> {
        Some(&[LAN_GET_BROADCASTFLAGS as u8])
    }
}

/// `LAN_SYSTEMSTATE_GETDATA` request, answered by
/// `LAN_SYSTEMSTATE_DATACHANGED`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SystemState {
    /// Main track current in mA.
    pub main_current: i16,
    /// Programming track current in mA.
    pub prog_current: i16,
    /// Smoothed main track current in mA.
    pub filtered_main_current: i16,
    /// Internal temperature in °C.
    pub temperature: i16,
    /// Supply voltage in mV.
    pub supply_voltage: u16,
    /// Internal track voltage in mV.
    pub vcc_voltage: u16,
    pub central_state: CentralState,
    pub central_state_ex: u8,
    pub capabilities: u8,
}

impl SystemState {
    /// Size of the state block.
    pub const LEN: usize = 16;

    // central_state_ex bits
    pub const HIGH_TEMPERATURE: u8 = 0x01;
    pub const POWER_LOST: u8 = 0x02;
    pub const SHORT_CIRCUIT_EXTERNAL: u8 = 0x04;
    pub const SHORT_CIRCUIT_INTERNAL: u8 = 0x08;
    pub const RCN213: u8 = 0x20;
}

impl Variant for SystemState {
    const HEADER: u16 = LAN_SYSTEMSTATE_GETDATA;

    fn encode(&self, _dst: &mut BytesMut) {}

    fn decode(payload: &[u8]) -> Result<Self> {
        let mut r = PayloadReader::new(payload);
        let main_current = r.read_i16_le()?;
        let prog_current = r.read_i16_le()?;
        let filtered_main_current = r.read_i16_le()?;
        let temperature = r.read_i16_le()?;
        let supply_voltage = r.read_u16_le()?;
        let vcc_voltage = r.read_u16_le()?;
        let central_state = CentralState(r.read_u8()?);
        let central_state_ex = r.read_u8()?;
        r.skip(1)?;
        let capabilities = r.read_u8()?;
        Ok(Self {
            main_current,
            prog_current,
            filtered_main_current,
            temperature,
            supply_voltage,
            vcc_voltage,
            central_state,
            central_state_ex,
            capabilities,
        })
    }

    fn identity(&self) -> Option<&'static [u8]> {
        Some(&[LAN_SYSTEMSTATE_DATACHANGED as u8])
    }
}

/// Occupancy report carried by a `LAN_CAN_DETECTOR` reply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CanOccupancy {
    pub address: u16,
    pub port: u8,
    pub kind: u8,
    pub value1: u16,
    pub value2: u16,
}

/// `LAN_CAN_DETECTOR` query and reply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CanDetector {
    /// CAN network id to query; [`CanDetector::BROADCAST`] asks every
    /// detector.
    pub network_id: u16,
    /// Present on replies.
    pub occupancy: Option<CanOccupancy>,
}

impl CanDetector {
    pub const BROADCAST: u16 = 0xD000;

    pub fn query(network_id: u16) -> Self {
        Self {
            network_id,
            occupancy: None,
        }
    }
}

impl Variant for CanDetector {
    const HEADER: u16 = LAN_CAN_DETECTOR;

    fn encode(&self, dst: &mut BytesMut) {
        dst.put_u8(0x00);
        dst.put_u16_le(self.network_id);
    }

    fn decode(payload: &[u8]) -> Result<Self> {
        let mut r = PayloadReader::new(payload);
        let network_id = r.read_u16_le()?;
        let occupancy = CanOccupancy {
            address: r.read_u16_le()?,
            port: r.read_u8()?,
            kind: r.read_u8()?,
            value1: r.read_u16_le()?,
            value2: r.read_u16_le()?,
        };
        Ok(Self {
            network_id,
            occupancy: Some(occupancy),
        })
    }

    fn identity(&self) -> Option<&'static [u8]> {
        Some(&[LAN_CAN_DETECTOR as u8])
    }
}
