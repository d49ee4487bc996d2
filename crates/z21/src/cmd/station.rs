use tracing::debug;
use z21_conn::{connect_with_options, ConnOptions, Connection, Result};
use z21_message::{BroadcastMask, Message};

use crate::cmd::Context;
use crate::exit::{conn_error, CliResult, SUCCESS};
use crate::output::print_message;

/// One request/reply exchange issued by a subcommand.
#[derive(Debug, Clone, Copy)]
pub enum Query {
    HwInfo,
    SerialNumber,
    LockCode,
    XBusVersion,
    Status,
    SystemState,
    BroadcastFlags { set: Option<BroadcastMask> },
    TrackPower(bool),
    Stop,
    LocoInfo(u16),
}

impl Query {
    fn name(self) -> &'static str {
        match self {
            Query::HwInfo => "hwinfo",
            Query::SerialNumber => "serial",
            Query::LockCode => "code",
            Query::XBusVersion => "xbus-version",
            Query::Status => "status",
            Query::SystemState => "system-state",
            Query::BroadcastFlags { .. } => "broadcast-flags",
            Query::TrackPower(_) => "power",
            Query::Stop => "stop",
            Query::LocoInfo(_) => "loco",
        }
    }
}

pub async fn open(ctx: &Context) -> CliResult<Connection> {
    let options = ConnOptions::default().with_timeout(ctx.timeout);
    connect_with_options(&ctx.server, options)
        .await
        .map_err(|err| conn_error("connect failed", err))
}

/// Log off and close; the station forgets the client either way.
pub async fn hang_up(conn: &Connection) {
    if let Err(err) = conn.logoff().await {
        debug!(error = %err, "logoff failed");
    }
    conn.close();
}

pub async fn run(query: Query, ctx: &Context) -> CliResult<i32> {
    let conn = open(ctx).await?;
    let result = ask(&conn, query).await;
    hang_up(&conn).await;

    let reply = result.map_err(|err| conn_error(query.name(), err))?;
    print_message(&reply, ctx.format);
    Ok(SUCCESS)
}

async fn ask(conn: &Connection, query: Query) -> Result<Message> {
    let reply: Message = match query {
        Query::HwInfo => conn.hardware_info().await?.into(),
        Query::SerialNumber => conn.serial_number().await?.into(),
        Query::LockCode => conn.lock_code().await?.into(),
        Query::XBusVersion => conn.xbus_version().await?.into(),
        Query::Status => conn.status().await?.into(),
        Query::SystemState => conn.system_state().await?.into(),
        Query::BroadcastFlags { set } => {
            if let Some(flags) = set {
                conn.set_broadcast_flags(flags).await?;
            }
            conn.broadcast_flags().await?.into()
        }
        Query::TrackPower(on) => conn.track_power(on).await?.into(),
        Query::Stop => conn.stop().await?.into(),
        Query::LocoInfo(address) => conn.loco_info(address).await?.into(),
    };
    Ok(reply)
}
