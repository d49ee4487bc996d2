mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;
use z21_transport::DEFAULT_ADDR;

use crate::cmd::{Command, Context};
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "z21", version, about = "Z21 command station client")]
struct Cli {
    /// Command station address; the port defaults to 21105.
    #[arg(
        long,
        short = 's',
        env = "Z21_SERVER",
        default_value = DEFAULT_ADDR,
        global = true
    )]
    server: String,

    /// How long to wait for each reply (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s", global = true)]
    timeout: String,

    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    /// Log every frame sent and received (same as --log-level debug).
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level.with_verbose(cli.verbose));

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = match cmd::parse_duration(&cli.timeout) {
        Ok(timeout) => {
            let ctx = Context {
                server: cli.server,
                timeout,
                format,
            };
            cmd::run(cli.command, &ctx).await
        }
        Err(err) => Err(err),
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "z21",
            "hwinfo",
            "--server",
            "192.168.0.111",
            "--timeout",
            "3s",
        ])
        .expect("hwinfo args should parse");

        assert!(matches!(cli.command, Command::Hwinfo));
        assert_eq!(cli.server, "192.168.0.111");
        assert_eq!(cli.timeout, "3s");
    }

    #[test]
    fn parses_power_state() {
        let cli = Cli::try_parse_from(["z21", "-s", "10.0.0.2", "power", "off"])
            .expect("power args should parse");
        assert!(matches!(
            cli.command,
            Command::Power(cmd::PowerArgs {
                state: cmd::PowerState::Off
            })
        ));
    }

    #[test]
    fn rejects_unknown_power_state() {
        let err = Cli::try_parse_from(["z21", "power", "sideways"])
            .expect_err("bad power state should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);
    }

    #[test]
    fn rejects_out_of_range_loco_address() {
        assert!(Cli::try_parse_from(["z21", "loco", "0"]).is_err());
        assert!(Cli::try_parse_from(["z21", "loco", "10000"]).is_err());
        assert!(Cli::try_parse_from(["z21", "loco", "3"]).is_ok());
    }

    #[test]
    fn verbose_flag_parses_anywhere() {
        let cli = Cli::try_parse_from(["z21", "status", "-v"]).expect("status args should parse");
        assert!(cli.verbose);
        assert_eq!(cli.log_level.with_verbose(cli.verbose), LogLevel::Debug);
    }

    #[test]
    fn subcommands_use_kebab_case() {
        for name in ["xbus-version", "system-state", "broadcast-flags", "stop", "listen"] {
            assert!(
                Cli::try_parse_from(["z21", name]).is_ok(),
                "{name} should parse"
            );
        }
    }
}
