use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use z21_message::Message;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

pub fn print_message(msg: &Message, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(msg).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FIELD", "VALUE"]);
            table.add_row(vec!["message".to_string(), msg.name().to_string()]);
            for (field, value) in fields(msg) {
                table.add_row(vec![field.to_string(), value]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            let line = fields(msg)
                .into_iter()
                .map(|(field, value)| format!("{field}={value}"))
                .collect::<Vec<_>>()
                .join(" ");
            if line.is_empty() {
                println!("{}", msg.name());
            } else {
                println!("{} {line}", msg.name());
            }
        }
    }
}

/// Human-readable fields of a message, in display order.
pub fn fields(msg: &Message) -> Vec<(&'static str, String)> {
    match msg {
        Message::SerialNumber(m) => vec![("serial", m.serial.to_string())],
        Message::LockCode(m) => vec![
            ("code", format!("0x{:02x}", m.code)),
            ("state", m.describe().to_string()),
        ],
        Message::HwInfo(m) => vec![
            ("hardware", m.hardware.to_string()),
            ("hardware_id", format!("0x{:08x}", m.hardware.id)),
            (
                "firmware",
                m.firmware
                    .map(|f| f.to_string())
                    .unwrap_or_else(|| "invalid".to_string()),
            ),
        ],
        Message::Logoff(_) => Vec::new(),
        Message::SetBroadcastFlags(m) => mask_fields(m.flags.0, m.flags.flag_names()),
        Message::BroadcastFlags(m) => mask_fields(m.flags.0, m.flags.flag_names()),
        Message::SystemState(m) => vec![
            ("main_current", format!("{} mA", m.main_current)),
            ("prog_current", format!("{} mA", m.prog_current)),
            ("filtered_main_current", format!("{} mA", m.filtered_main_current)),
            ("temperature", format!("{} °C", m.temperature)),
            ("supply_voltage", format!("{} mV", m.supply_voltage)),
            ("vcc_voltage", format!("{} mV", m.vcc_voltage)),
            ("central_state", state_list(m.central_state.flag_names())),
            ("central_state_ex", format!("0x{:02x}", m.central_state_ex)),
            ("capabilities", format!("0x{:02x}", m.capabilities)),
        ],
        Message::CanDetector(m) => {
            let mut out = vec![("network_id", format!("0x{:04x}", m.network_id))];
            if let Some(occ) = &m.occupancy {
                out.push(("address", occ.address.to_string()));
                out.push(("port", occ.port.to_string()));
                out.push(("type", format!("0x{:02x}", occ.kind)));
                out.push(("value1", occ.value1.to_string()));
                out.push(("value2", occ.value2.to_string()));
            }
            out
        }
        Message::Status(m) => vec![
            ("state", format!("0x{:02x}", m.state.0)),
            ("flags", state_list(m.state.flag_names())),
        ],
        Message::Stop(_) => vec![("stopped", "true".to_string())],
        Message::LocoInfo(m) => {
            let mut out = vec![("address", m.address.to_string())];
            if let Some(drive) = &m.drive {
                out.push(("speed", format!("{}/{}", drive.speed, drive.speed_steps)));
                out.push((
                    "direction",
                    if drive.forward { "forward" } else { "reverse" }.to_string(),
                ));
                out.push(("light", drive.light.to_string()));
                out.push(("busy", drive.busy.to_string()));
            }
            out
        }
        Message::TrackPower(m) => vec![("power", if m.on { "on" } else { "off" }.to_string())],
        Message::Version(m) => vec![
            ("xbus_protocol", m.xbus_protocol.to_string()),
            ("command_station", m.station.to_string()),
        ],
    }
}

fn mask_fields(raw: u32, names: Vec<&'static str>) -> Vec<(&'static str, String)> {
    vec![
        ("flags", format!("0x{raw:08x}")),
        ("subscriptions", state_list(names)),
    ]
}

fn state_list(names: Vec<&'static str>) -> String {
    if names.is_empty() {
        "none".to_string()
    } else {
        names.join(",")
    }
}

#[cfg(test)]
mod tests {
    use z21_message::{BroadcastFlags, BroadcastMask, CentralState, Status, TrackPower};

    use super::*;

    #[test]
    fn track_power_fields() {
        let msg = Message::from(TrackPower { on: true });
        assert_eq!(fields(&msg), vec![("power", "on".to_string())]);
    }

    #[test]
    fn status_lists_flags() {
        let msg = Message::from(Status {
            state: CentralState(CentralState::EMERGENCY_STOP | CentralState::TRACK_VOLTAGE_OFF),
        });
        let out = fields(&msg);
        assert_eq!(out[0], ("state", "0x03".to_string()));
        assert_eq!(
            out[1],
            ("flags", "emergency stop,track voltage off".to_string())
        );
    }

    #[test]
    fn empty_mask_reads_none() {
        let msg = Message::from(BroadcastFlags {
            flags: BroadcastMask(0),
        });
        assert_eq!(fields(&msg)[1], ("subscriptions", "none".to_string()));
    }
}
