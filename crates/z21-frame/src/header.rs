//! Protocol constant table.
//!
//! Frame headers are 16-bit values; the X-Bus family (`LAN_X`) multiplexes a
//! nested protocol whose first payload byte is the X-header and, for some
//! X-headers, the second payload byte (DB0) selects the command. The POM
//! sub-tree goes one level deeper on DB3 (`payload[4]`).
//!
//! Names follow the command station's published LAN protocol.

use std::borrow::Cow;

use crate::codec::Frame;

// Frame headers, client to station.
pub const LAN_GET_SERIAL_NUMBER: u16 = 0x10;
pub const LAN_GET_CODE: u16 = 0x18;
pub const LAN_GET_HWINFO: u16 = 0x1A;
pub const LAN_LOGOFF: u16 = 0x30;
pub const LAN_X: u16 = 0x40;
pub const LAN_SET_BROADCASTFLAGS: u16 = 0x50;
pub const LAN_GET_BROADCASTFLAGS: u16 = 0x51;
pub const LAN_GET_LOCOMODE: u16 = 0x60;
pub const LAN_SET_LOCOMODE: u16 = 0x61;
pub const LAN_GET_TURNOUTMODE: u16 = 0x70;
pub const LAN_SET_TURNOUTMODE: u16 = 0x71;
pub const LAN_RMBUS_GETDATA: u16 = 0x81;
pub const LAN_RMBUS_PROGRAMMODULE: u16 = 0x82;
pub const LAN_SYSTEMSTATE_GETDATA: u16 = 0x85;
pub const LAN_RAILCOM_GETDATA: u16 = 0x89;
pub const LAN_LOCONET_FROM_LAN: u16 = 0xA2;
pub const LAN_LOCONET_DETECTOR: u16 = 0xA3;
pub const LAN_LOCONET_DISPATCH_ADDR: u16 = 0xA4;
pub const LAN_BOOSTER_SET_POWER: u16 = 0xB2;
pub const LAN_BOOSTER_GET_DESCRIPTION: u16 = 0xB8;
pub const LAN_BOOSTER_SET_DESCRIPTION: u16 = 0xB9;
pub const LAN_BOOSTER_SYSTEMSTATE_GETDATA: u16 = 0xBB;
pub const LAN_CAN_DETECTOR: u16 = 0xC4;
pub const LAN_CAN_DEVICE_GET_DESCRIPTION: u16 = 0xC8;
pub const LAN_CAN_DEVICE_SET_DESCRIPTION: u16 = 0xC9;
pub const LAN_CAN_BOOSTER_SET_TRACKPOWER: u16 = 0xCB;
pub const LAN_FAST_CLOCK_CONTROL: u16 = 0xCC;
pub const LAN_FAST_CLOCK_SETTINGS_GET: u16 = 0xCE;
pub const LAN_FAST_CLOCK_SETTINGS_SET: u16 = 0xCF;
pub const LAN_DECODER_GET_DESCRIPTION: u16 = 0xD8;
pub const LAN_DECODER_SET_DESCRIPTION: u16 = 0xD9;
pub const LAN_DECODER_SYSTEMSTATE_GETDATA: u16 = 0xDB;
pub const LAN_ZLINK: u16 = 0xE8;

// Frame headers, station to client.
pub const LAN_RMBUS_DATACHANGED: u16 = 0x80;
pub const LAN_SYSTEMSTATE_DATACHANGED: u16 = 0x84;
pub const LAN_RAILCOM_DATACHANGED: u16 = 0x88;
pub const LAN_LOCONET_Z21_RX: u16 = 0xA0;
pub const LAN_LOCONET_Z21_TX: u16 = 0xA1;
pub const LAN_BOOSTER_SYSTEMSTATE_DATACHANGED: u16 = 0xBA;
pub const LAN_CAN_BOOSTER_SYSTEMSTATE_CHGD: u16 = 0xCA;
pub const LAN_FAST_CLOCK_DATA: u16 = 0xCD;
pub const LAN_DECODER_SYSTEMSTATE_DATACHANGED: u16 = 0xDA;

// X-headers (payload[0] of a LAN_X frame).
pub const X_21: u8 = 0x21;
pub const X_DCC_READ_REGISTER: u8 = 0x22;
pub const X_23: u8 = 0x23;
pub const X_24: u8 = 0x24;
pub const X_GET_TURNOUT_INFO: u8 = 0x43;
pub const X_GET_EXT_ACCESSORY_INFO: u8 = 0x44;
pub const X_SET_TURNOUT: u8 = 0x53;
pub const X_SET_EXT_ACCESSORY: u8 = 0x54;
pub const X_61: u8 = 0x61;
pub const X_STATUS_CHANGED: u8 = 0x62;
pub const X_63: u8 = 0x63;
pub const X_CV_RESULT: u8 = 0x64;
pub const X_SET_STOP: u8 = 0x80;
pub const X_BC_STOPPED: u8 = 0x81;
pub const X_SET_LOCO_E_STOP: u8 = 0x92;
pub const X_E3: u8 = 0xE3;
pub const X_E4: u8 = 0xE4;
pub const X_E6: u8 = 0xE6;
pub const X_LOCO_INFO: u8 = 0xEF;
pub const X_F1: u8 = 0xF1;
pub const X_F3: u8 = 0xF3;

// DB0 values (payload[1]), grouped by the X-header they follow.
/// `X_21` and `X_63`.
pub const DB0_GET_VERSION: u8 = 0x21;
/// `X_21`.
pub const DB0_GET_STATUS: u8 = 0x24;
/// `X_21`.
pub const DB0_SET_TRACK_POWER_OFF: u8 = 0x80;
/// `X_21`.
pub const DB0_SET_TRACK_POWER_ON: u8 = 0x81;
/// `X_23`.
pub const DB0_CV_READ: u8 = 0x11;
/// `X_23`.
pub const DB0_DCC_WRITE_REGISTER: u8 = 0x12;
/// `X_24`.
pub const DB0_CV_WRITE: u8 = 0x12;
/// `X_24`.
pub const DB0_MM_WRITE_BYTE: u8 = 0xFF;
/// `X_61`.
pub const DB0_BC_TRACK_POWER_OFF: u8 = 0x00;
/// `X_61`.
pub const DB0_BC_TRACK_POWER_ON: u8 = 0x01;
/// `X_61`.
pub const DB0_BC_PROGRAMMING_MODE: u8 = 0x02;
/// `X_61`.
pub const DB0_BC_TRACK_SHORT_CIRCUIT: u8 = 0x08;
/// `X_61`.
pub const DB0_CV_NACK_SC: u8 = 0x12;
/// `X_61`.
pub const DB0_CV_NACK: u8 = 0x13;
/// `X_61`.
pub const DB0_UNKNOWN_COMMAND: u8 = 0x82;
/// `X_E3`.
pub const DB0_PURGE_LOCO: u8 = 0x44;
/// `X_E3`.
pub const DB0_GET_LOCO_INFO: u8 = 0xF0;
/// `X_E4`, speed steps 14 / 28 / 128.
pub const DB0_SET_LOCO_DRIVE: [u8; 3] = [0x10, 0x12, 0x13];
/// `X_E4`.
pub const DB0_SET_LOCO_FUNCTION: u8 = 0xF8;
/// `X_E4`, function groups 1 to 10.
pub const DB0_SET_LOCO_FUNCTION_GROUP: [u8; 10] =
    [0x20, 0x21, 0x22, 0x23, 0x28, 0x29, 0x2A, 0x2B, 0x50, 0x51];
/// `X_E4`.
pub const DB0_SET_LOCO_BINARY_STATE: u8 = 0x5F;
/// `X_E6`, POM on a locomotive decoder.
pub const DB0_POM_LOCO: u8 = 0x30;
/// `X_E6`, POM on an accessory decoder.
pub const DB0_POM_ACCESSORY: u8 = 0x31;
/// `X_F1` and `X_F3`.
pub const DB0_GET_FIRMWARE_VERSION: u8 = 0x0A;

// DB3 values (payload[4]) below `X_E6` / `DB0_POM_*`.
pub const DB3_POM_WRITE_BYTE: u8 = 0xEC;
pub const DB3_POM_WRITE_BIT: u8 = 0xE8;
pub const DB3_POM_READ_BYTE: u8 = 0xE4;

// Sub-header of a LAN_ZLINK frame.
pub const ZLINK_GET_HWINFO: u8 = 0x06;

/// Returns a human-readable name for a frame, for diagnostics.
///
/// Never panics: short payloads and unknown discriminators render as
/// `UNKNOWN ...` / `TRUNCATED ...` names.
pub fn frame_name(frame: &Frame) -> Cow<'static, str> {
    let p = frame.payload.as_ref();
    match frame.header {
        LAN_X => match p.first() {
            Some(&x) => x_name(x, p),
            None => Cow::Borrowed("TRUNCATED LAN_X"),
        },
        LAN_ZLINK => match p.first() {
            Some(&ZLINK_GET_HWINFO) => Cow::Borrowed("LAN_ZLINK_GET_HWINFO"),
            Some(&x) => Cow::Owned(format!("UNKNOWN ZLINK header: ({x:02x})")),
            None => Cow::Borrowed("TRUNCATED LAN_ZLINK"),
        },
        other => match header_name(other) {
            Some(name) => Cow::Borrowed(name),
            None => Cow::Owned(format!("UNKNOWN header: ({other:02x})")),
        },
    }
}

/// Name of a plain (non-multiplexed) frame header.
pub fn header_name(header: u16) -> Option<&'static str> {
    let name = match header {
        LAN_GET_SERIAL_NUMBER => "LAN_GET_SERIAL_NUMBER",
        LAN_GET_CODE => "LAN_GET_CODE",
        LAN_GET_HWINFO => "LAN_GET_HWINFO",
        LAN_LOGOFF => "LAN_LOGOFF",
        LAN_X => "LAN_X",
        LAN_SET_BROADCASTFLAGS => "LAN_SET_BROADCASTFLAGS",
        LAN_GET_BROADCASTFLAGS => "LAN_GET_BROADCASTFLAGS",
        LAN_GET_LOCOMODE => "LAN_GET_LOCOMODE",
        LAN_SET_LOCOMODE => "LAN_SET_LOCOMODE",
        LAN_GET_TURNOUTMODE => "LAN_GET_TURNOUTMODE",
        LAN_SET_TURNOUTMODE => "LAN_SET_TURNOUTMODE",
        LAN_RMBUS_DATACHANGED => "LAN_RMBUS_DATACHANGED",
        LAN_RMBUS_GETDATA => "LAN_RMBUS_GETDATA",
        LAN_RMBUS_PROGRAMMODULE => "LAN_RMBUS_PROGRAMMODULE",
        LAN_SYSTEMSTATE_DATACHANGED => "LAN_SYSTEMSTATE_DATACHANGED",
        LAN_SYSTEMSTATE_GETDATA => "LAN_SYSTEMSTATE_GETDATA",
        LAN_RAILCOM_DATACHANGED => "LAN_RAILCOM_DATACHANGED",
        LAN_RAILCOM_GETDATA => "LAN_RAILCOM_GETDATA",
        LAN_LOCONET_Z21_RX => "LAN_LOCONET_Z21_RX",
        LAN_LOCONET_Z21_TX => "LAN_LOCONET_Z21_TX",
        LAN_LOCONET_FROM_LAN => "LAN_LOCONET_FROM_LAN",
        LAN_LOCONET_DETECTOR => "LAN_LOCONET_DETECTOR",
        LAN_LOCONET_DISPATCH_ADDR => "LAN_LOCONET_DISPATCH_ADDR",
        LAN_BOOSTER_SET_POWER => "LAN_BOOSTER_SET_POWER",
        LAN_BOOSTER_GET_DESCRIPTION => "LAN_BOOSTER_GET_DESCRIPTION",
        LAN_BOOSTER_SET_DESCRIPTION => "LAN_BOOSTER_SET_DESCRIPTION",
        LAN_BOOSTER_SYSTEMSTATE_DATACHANGED => "LAN_BOOSTER_SYSTEMSTATE_DATACHANGED",
        LAN_BOOSTER_SYSTEMSTATE_GETDATA => "LAN_BOOSTER_SYSTEMSTATE_GETDATA",
        LAN_CAN_DETECTOR => "LAN_CAN_DETECTOR",
        LAN_CAN_DEVICE_GET_DESCRIPTION => "LAN_CAN_DEVICE_GET_DESCRIPTION",
        LAN_CAN_DEVICE_SET_DESCRIPTION => "LAN_CAN_DEVICE_SET_DESCRIPTION",
        LAN_CAN_BOOSTER_SYSTEMSTATE_CHGD => "LAN_CAN_BOOSTER_SYSTEMSTATE_CHGD",
        LAN_CAN_BOOSTER_SET_TRACKPOWER => "LAN_CAN_BOOSTER_SET_TRACKPOWER",
        LAN_FAST_CLOCK_CONTROL => "LAN_FAST_CLOCK_CONTROL",
        LAN_FAST_CLOCK_DATA => "LAN_FAST_CLOCK_DATA",
        LAN_FAST_CLOCK_SETTINGS_GET => "LAN_FAST_CLOCK_SETTINGS_GET",
        LAN_FAST_CLOCK_SETTINGS_SET => "LAN_FAST_CLOCK_SETTINGS_SET",
        LAN_DECODER_GET_DESCRIPTION => "LAN_DECODER_GET_DESCRIPTION",
        LAN_DECODER_SET_DESCRIPTION => "LAN_DECODER_SET_DESCRIPTION",
        LAN_DECODER_SYSTEMSTATE_DATACHANGED => "LAN_DECODER_SYSTEMSTATE_DATACHANGED",
        LAN_DECODER_SYSTEMSTATE_GETDATA => "LAN_DECODER_SYSTEMSTATE_GETDATA",
        LAN_ZLINK => "LAN_ZLINK",
        _ => return None,
    };
    Some(name)
}

fn x_name(x: u8, p: &[u8]) -> Cow<'static, str> {
    let name = match x {
        X_21 => return db0_name(p, x21_name),
        X_DCC_READ_REGISTER => "LAN_X_DCC_READ_REGISTER",
        X_23 => return db0_name(p, x23_name),
        X_24 => return db0_name(p, x24_name),
        X_GET_TURNOUT_INFO => "LAN_X_GET_TURNOUT_INFO",
        X_GET_EXT_ACCESSORY_INFO => "LAN_X_GET_EXT_ACCESSORY_INFO",
        X_SET_TURNOUT => "LAN_X_SET_TURNOUT",
        X_SET_EXT_ACCESSORY => "LAN_X_SET_EXT_ACCESSORY",
        X_61 => return db0_name(p, x61_name),
        X_STATUS_CHANGED => "LAN_X_STATUS_CHANGED",
        X_63 => return db0_name(p, |db0| (db0 == DB0_GET_VERSION).then_some("LAN_X_GET_VERSION")),
        X_CV_RESULT => "LAN_X_CV_RESULT",
        X_SET_STOP => "LAN_X_SET_STOP",
        X_BC_STOPPED => "LAN_X_BC_STOPPED",
        X_SET_LOCO_E_STOP => "LAN_X_SET_LOCO_E_STOP",
        X_E3 => return db0_name(p, xe3_name),
        X_E4 => return db0_name(p, xe4_name),
        X_E6 => return xe6_name(p),
        X_LOCO_INFO => "LAN_X_LOCO_INFO",
        X_F1 | X_F3 => {
            return db0_name(p, |db0| {
                (db0 == DB0_GET_FIRMWARE_VERSION).then_some("LAN_X_GET_FIRMWARE_VERSION")
            })
        }
        other => return Cow::Owned(format!("UNKNOWN X-header: ({other:02x})")),
    };
    Cow::Borrowed(name)
}

fn db0_name(p: &[u8], lookup: impl Fn(u8) -> Option<&'static str>) -> Cow<'static, str> {
    match p.get(1) {
        Some(&db0) => match lookup(db0) {
            Some(name) => Cow::Borrowed(name),
            None => Cow::Owned(format!("UNKNOWN DB0: ({db0:02x})")),
        },
        None => Cow::Borrowed("TRUNCATED DB0"),
    }
}

fn x21_name(db0: u8) -> Option<&'static str> {
    match db0 {
        DB0_GET_VERSION => Some("LAN_X_GET_VERSION"),
        DB0_GET_STATUS => Some("LAN_X_GET_STATUS"),
        DB0_SET_TRACK_POWER_OFF => Some("LAN_X_SET_TRACK_POWER_OFF"),
        DB0_SET_TRACK_POWER_ON => Some("LAN_X_SET_TRACK_POWER_ON"),
        _ => None,
    }
}

fn x23_name(db0: u8) -> Option<&'static str> {
    match db0 {
        DB0_CV_READ => Some("LAN_X_CV_READ"),
        DB0_DCC_WRITE_REGISTER => Some("LAN_X_DCC_WRITE_REGISTER"),
        _ => None,
    }
}

fn x24_name(db0: u8) -> Option<&'static str> {
    match db0 {
        DB0_CV_WRITE => Some("LAN_X_CV_WRITE"),
        DB0_MM_WRITE_BYTE => Some("LAN_X_MM_WRITE_BYTE"),
        _ => None,
    }
}

fn x61_name(db0: u8) -> Option<&'static str> {
    match db0 {
        DB0_BC_TRACK_POWER_OFF => Some("LAN_X_BC_TRACK_POWER_OFF"),
        DB0_BC_TRACK_POWER_ON => Some("LAN_X_BC_TRACK_POWER_ON"),
        DB0_BC_PROGRAMMING_MODE => Some("LAN_X_BC_PROGRAMMING_MODE"),
        DB0_BC_TRACK_SHORT_CIRCUIT => Some("LAN_X_BC_TRACK_SHORT_CIRCUIT"),
        DB0_CV_NACK_SC => Some("LAN_X_CV_NACK_SC"),
        DB0_CV_NACK => Some("LAN_X_CV_NACK"),
        DB0_UNKNOWN_COMMAND => Some("LAN_X_UNKNOWN_COMMAND"),
        _ => None,
    }
}

fn xe3_name(db0: u8) -> Option<&'static str> {
    match db0 {
        DB0_PURGE_LOCO => Some("LAN_X_PURGE_LOCO"),
        DB0_GET_LOCO_INFO => Some("LAN_X_GET_LOCO_INFO"),
        _ => None,
    }
}

fn xe4_name(db0: u8) -> Option<&'static str> {
    match db0 {
        DB0_SET_LOCO_FUNCTION => Some("LAN_X_SET_LOCO_FUNCTION"),
        DB0_SET_LOCO_BINARY_STATE => Some("LAN_X_SET_LOCO_BINARY_STATE"),
        d if DB0_SET_LOCO_DRIVE.contains(&d) => Some("LAN_X_SET_LOCO_DRIVE"),
        d if DB0_SET_LOCO_FUNCTION_GROUP.contains(&d) => Some("LAN_X_SET_LOCO_FUNCTION_GROUP"),
        _ => None,
    }
}

fn xe6_name(p: &[u8]) -> Cow<'static, str> {
    let (Some(&db0), Some(&db3)) = (p.get(1), p.get(4)) else {
        return Cow::Borrowed("TRUNCATED LAN_X_CV_POM");
    };
    let name = match (db0, db3) {
        (DB0_POM_LOCO, DB3_POM_WRITE_BYTE) => "LAN_X_CV_POM_WRITE_BYTE",
        (DB0_POM_LOCO, DB3_POM_WRITE_BIT) => "LAN_X_CV_POM_WRITE_BIT",
        (DB0_POM_LOCO, DB3_POM_READ_BYTE) => "LAN_X_CV_POM_READ_BYTE",
        (DB0_POM_ACCESSORY, DB3_POM_WRITE_BYTE) => "LAN_X_CV_POM_ACCESSORY_WRITE_BYTE",
        (DB0_POM_ACCESSORY, DB3_POM_WRITE_BIT) => "LAN_X_CV_POM_ACCESSORY_WRITE_BIT",
        (DB0_POM_ACCESSORY, DB3_POM_READ_BYTE) => "LAN_X_CV_POM_ACCESSORY_READ_BYTE",
        (DB0_POM_LOCO | DB0_POM_ACCESSORY, db3) => {
            return Cow::Owned(format!("UNKNOWN DB3: ({db3:02x})"))
        }
        (db0, _) => return Cow::Owned(format!("UNKNOWN DB0: ({db0:02x})")),
    };
    Cow::Borrowed(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(header: u16, payload: &[u8]) -> String {
        frame_name(&Frame::new(header, payload.to_vec())).into_owned()
    }

    #[test]
    fn plain_headers() {
        assert_eq!(name(LAN_GET_HWINFO, &[]), "LAN_GET_HWINFO");
        assert_eq!(name(LAN_SYSTEMSTATE_DATACHANGED, &[0; 16]), "LAN_SYSTEMSTATE_DATACHANGED");
        assert_eq!(name(0x1234, &[]), "UNKNOWN header: (1234)");
    }

    #[test]
    fn xbus_levels() {
        assert_eq!(name(LAN_X, &[0x61, 0x01]), "LAN_X_BC_TRACK_POWER_ON");
        assert_eq!(name(LAN_X, &[0x21, 0x80, 0xA1]), "LAN_X_SET_TRACK_POWER_OFF");
        assert_eq!(name(LAN_X, &[0x63, 0x21, 0x30, 0x12]), "LAN_X_GET_VERSION");
        assert_eq!(name(LAN_X, &[0xE4, 0x13]), "LAN_X_SET_LOCO_DRIVE");
        assert_eq!(name(LAN_X, &[0xE4, 0x2A]), "LAN_X_SET_LOCO_FUNCTION_GROUP");
        assert_eq!(name(LAN_X, &[0x81, 0x00]), "LAN_X_BC_STOPPED");
        assert_eq!(name(LAN_X, &[0x61, 0x77]), "UNKNOWN DB0: (77)");
        assert_eq!(name(LAN_X, &[0x99]), "UNKNOWN X-header: (99)");
    }

    #[test]
    fn pom_db3_level() {
        assert_eq!(
            name(LAN_X, &[0xE6, 0x30, 0x00, 0x03, 0xEC, 0x00, 0x05]),
            "LAN_X_CV_POM_WRITE_BYTE"
        );
        assert_eq!(
            name(LAN_X, &[0xE6, 0x31, 0x00, 0x03, 0xE4]),
            "LAN_X_CV_POM_ACCESSORY_READ_BYTE"
        );
        assert_eq!(name(LAN_X, &[0xE6, 0x30, 0, 0, 0x01]), "UNKNOWN DB3: (01)");
    }

    #[test]
    fn short_payloads_never_panic() {
        assert_eq!(name(LAN_X, &[]), "TRUNCATED LAN_X");
        assert_eq!(name(LAN_X, &[0x61]), "TRUNCATED DB0");
        assert_eq!(name(LAN_X, &[0xE6, 0x30]), "TRUNCATED LAN_X_CV_POM");
        assert_eq!(name(LAN_ZLINK, &[]), "TRUNCATED LAN_ZLINK");
    }
}
