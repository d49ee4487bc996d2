//! Subscribe to track and system broadcasts and print them for a while.
//!
//! Run with: cargo run -p z21 --example watch-events -- 192.168.0.111

use std::time::Duration;

use z21::message::BroadcastMask;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let addr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| z21::transport::DEFAULT_ADDR.to_string());

    let conn = z21::connect(&addr).await?;
    conn.set_broadcast_flags(BroadcastMask(
        BroadcastMask::TRACK_UPDATES | BroadcastMask::SYSTEM_UPDATES,
    ))
    .await?;

    let events = conn.events();
    let watch = async {
        while let Some(event) = events.recv().await {
            println!("{} {:?}", event.name(), event);
        }
    };
    let _ = tokio::time::timeout(Duration::from_secs(30), watch).await;

    conn.logoff().await?;
    conn.close();
    Ok(())
}
