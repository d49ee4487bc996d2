//! Client for Roco/Fleischmann Z21 command stations.
//!
//! z21 talks the Z21 LAN protocol over UDP: request/reply exchanges matched by
//! message kind, plus unsolicited broadcasts delivered as an event stream.
//!
//! # Crate Structure
//!
//! - [`transport`]: Datagram transport abstraction (UDP, in-memory)
//! - [`frame`]: Length-prefixed frame codec and protocol constants
//! - [`message`]: Typed messages, dispatch tree and correlation keys
//! - [`conn`]: Connection engine with request correlation and events
//!
//! ```no_run
//! # async fn demo() -> z21::conn::Result<()> {
//! let conn = z21::connect("192.168.0.111").await?;
//! let info = conn.hardware_info().await?;
//! println!("{} firmware {:?}", info.hardware, info.firmware);
//! conn.logoff().await?;
//! # Ok(())
//! # }
//! ```

/// Re-export transport types.
pub mod transport {
    pub use z21_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use z21_frame::*;
}

/// Re-export message types.
pub mod message {
    pub use z21_message::*;
}

/// Re-export connection types.
pub mod conn {
    pub use z21_conn::*;
}

pub use z21_conn::{connect, connect_with_options, ConnError, ConnOptions, Connection, EventStream};
pub use z21_message::Message;
