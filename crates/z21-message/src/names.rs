//! Human-readable names for numeric identifiers reported by the station.

/// Name of a hardware type reported by `LAN_GET_HWINFO`.
pub fn hardware_name(id: u32) -> Option<&'static str> {
    let name = match id {
        0x0000_0200 => "black Z21 (2012)",
        0x0000_0201 => "black Z21 (2013)",
        0x0000_0202 => "SmartRail (2012)",
        0x0000_0203 => "white Z21 Starter (2013)",
        0x0000_0204 => "white Z21 Starter (2016)",
        0x0000_0205 => "Z21 Single Booster",
        0x0000_0206 => "Z21 Dual Booster",
        0x0000_0211 => "Z21 XL Series (2020)",
        0x0000_0212 => "Z21 XL Booster (2021)",
        0x0000_0301 => "Z21 Switch Decoder",
        0x0000_0302 => "Z21 Signal Decoder",
        _ => return None,
    };
    Some(name)
}

/// Name of a command station id reported by `LAN_X_GET_VERSION`.
pub fn command_station_name(id: u8) -> Option<&'static str> {
    match id {
        0x12 => Some("Z21"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_and_unknown_ids() {
        assert_eq!(hardware_name(0x200), Some("black Z21 (2012)"));
        assert_eq!(hardware_name(0x302), Some("Z21 Signal Decoder"));
        assert_eq!(hardware_name(0x999), None);
        assert_eq!(command_station_name(0x12), Some("Z21"));
        assert_eq!(command_station_name(0x13), None);
    }
}
