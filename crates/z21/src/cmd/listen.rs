use crate::cmd::station::{hang_up, open};
use crate::cmd::{parse_flags, Context, ListenArgs};
use crate::exit::{conn_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::print_message;

pub async fn run(args: ListenArgs, ctx: &Context) -> CliResult<i32> {
    let subscribe = args.subscribe.as_deref().map(parse_flags).transpose()?;
    if args.count == Some(0) {
        return Ok(SUCCESS);
    }

    let conn = open(ctx).await?;
    if let Some(flags) = subscribe {
        if let Err(err) = conn.set_broadcast_flags(flags).await {
            hang_up(&conn).await;
            return Err(conn_error("subscribe failed", err));
        }
    }

    let events = conn.events();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut printed = 0usize;
    let outcome = loop {
        tokio::select! {
            signal = &mut ctrl_c => {
                break signal
                    .map(|()| SUCCESS)
                    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")));
            }
            event = events.recv() => {
                let Some(message) = event else {
                    break Ok(SUCCESS);
                };
                print_message(&message, ctx.format);
                printed = printed.saturating_add(1);
                if args.count.is_some_and(|count| printed >= count) {
                    break Ok(SUCCESS);
                }
            }
        }
    };

    hang_up(&conn).await;
    outcome
}
