use std::time::Duration;

use clap::{Args, Subcommand, ValueEnum};
use z21_message::BroadcastMask;

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod listen;
pub mod station;
pub mod version;

/// Settings shared by every subcommand.
#[derive(Debug, Clone)]
pub struct Context {
    pub server: String,
    pub timeout: Duration,
    pub format: OutputFormat,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show hardware type and firmware version.
    Hwinfo,
    /// Show the serial number.
    Serial,
    /// Show the feature lock code.
    Code,
    /// Show the X-Bus protocol version and command station id.
    XbusVersion,
    /// Show the central state bits.
    Status,
    /// Show track currents, voltages and temperature.
    SystemState,
    /// Show broadcast subscriptions, optionally replacing them first.
    BroadcastFlags(BroadcastFlagsArgs),
    /// Switch track power and wait for the confirmation broadcast.
    Power(PowerArgs),
    /// Emergency stop all locos.
    Stop,
    /// Show the driving state of one loco.
    Loco(LocoArgs),
    /// Print unsolicited broadcasts until Ctrl-C.
    Listen(ListenArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub async fn run(command: Command, ctx: &Context) -> CliResult<i32> {
    use station::Query;

    let query = match command {
        Command::Version(args) => return version::run(args),
        Command::Listen(args) => return listen::run(args, ctx).await,
        Command::Hwinfo => Query::HwInfo,
        Command::Serial => Query::SerialNumber,
        Command::Code => Query::LockCode,
        Command::XbusVersion => Query::XBusVersion,
        Command::Status => Query::Status,
        Command::SystemState => Query::SystemState,
        Command::BroadcastFlags(args) => Query::BroadcastFlags {
            set: args.set.as_deref().map(parse_flags).transpose()?,
        },
        Command::Power(args) => Query::TrackPower(args.state == PowerState::On),
        Command::Stop => Query::Stop,
        Command::Loco(args) => Query::LocoInfo(args.address),
    };
    station::run(query, ctx).await
}

#[derive(Args, Debug)]
pub struct BroadcastFlagsArgs {
    /// Subscribe to FLAGS before reading them back: a number (`0x00010101`)
    /// or comma-separated names (`track,system,loco`).
    #[arg(long, value_name = "FLAGS")]
    pub set: Option<String>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum PowerState {
    On,
    Off,
}

#[derive(Args, Debug)]
pub struct PowerArgs {
    pub state: PowerState,
}

#[derive(Args, Debug)]
pub struct LocoArgs {
    /// DCC address (1-9999).
    #[arg(value_parser = clap::value_parser!(u16).range(1..=9999))]
    pub address: u16,
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// Subscribe to FLAGS first (same syntax as `broadcast-flags --set`).
    #[arg(long, value_name = "FLAGS")]
    pub subscribe: Option<String>,
    /// Exit after receiving N messages.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Parse a duration such as `5s`, `500ms` or `2` (seconds).
pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "timeout must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid timeout value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "timeout must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}

/// Parse a broadcast mask given as a number or as comma-separated names.
pub fn parse_flags(input: &str) -> CliResult<BroadcastMask> {
    let input = input.trim();
    if let Some(hex) = input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
    {
        return u32::from_str_radix(hex, 16)
            .map(BroadcastMask)
            .map_err(|_| CliError::new(USAGE, format!("invalid flags value: {input}")));
    }
    if let Ok(value) = input.parse::<u32>() {
        return Ok(BroadcastMask(value));
    }

    input
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .try_fold(0u32, |mask, name| {
            BroadcastMask::flag_by_name(name)
                .map(|bit| mask | bit)
                .ok_or_else(|| CliError::new(USAGE, format!("unknown broadcast flag: {name}")))
        })
        .map(BroadcastMask)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_seconds() {
        assert_eq!(parse_duration("5s").unwrap(), Duration::from_secs(5));
        assert_eq!(parse_duration("2").unwrap(), Duration::from_secs(2));
    }

    #[test]
    fn parse_duration_millis() {
        assert_eq!(parse_duration("150ms").unwrap(), Duration::from_millis(150));
    }

    #[test]
    fn parse_duration_invalid() {
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("bad").is_err());
        assert_eq!(parse_duration("").unwrap_err().code, USAGE);
    }

    #[test]
    fn parse_flags_forms() {
        assert_eq!(parse_flags("0x00000101").unwrap(), BroadcastMask(0x101));
        assert_eq!(parse_flags("257").unwrap(), BroadcastMask(0x101));
        assert_eq!(
            parse_flags("track, system").unwrap(),
            BroadcastMask(BroadcastMask::TRACK_UPDATES | BroadcastMask::SYSTEM_UPDATES)
        );
        assert_eq!(parse_flags("track,warp").unwrap_err().code, USAGE);
        assert!(parse_flags("0xZZ").is_err());
    }
}
