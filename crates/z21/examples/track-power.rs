//! Switch track power on a command station.
//!
//! Run with: cargo run -p z21 --example track-power -- 192.168.0.111 on

use z21::message::CentralState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let addr = args.next().unwrap_or_else(|| z21::transport::DEFAULT_ADDR.to_string());
    let on = !matches!(args.next().as_deref(), Some("off"));

    let conn = z21::connect(&addr).await?;
    let power = conn.track_power(on).await?;
    println!("track power {}", if power.on { "on" } else { "off" });

    let status = conn.status().await?;
    if status.state.has(CentralState::SHORT_CIRCUIT) {
        println!("warning: short circuit reported");
    }

    conn.logoff().await?;
    conn.close();
    Ok(())
}
