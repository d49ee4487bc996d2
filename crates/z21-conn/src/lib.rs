//! Request/reply correlation over a Z21 LAN connection.
//!
//! This is the "just works" layer. Open a [`Connection`], issue requests from
//! any number of tasks, and read broadcasts from its [`EventStream`].
//!
//! Replies are matched to requests by message kind (see
//! [`z21_message::fingerprint`]): the oldest pending request of the same kind
//! receives the reply, and anything nobody waits for becomes an event.

pub mod config;
pub mod connection;
pub mod connector;
pub mod correlation;
pub mod error;
pub mod events;

pub use config::{ConnOptions, DEFAULT_EVENT_CAPACITY, DEFAULT_RECV_BUFFER_SIZE, DEFAULT_TIMEOUT};
pub use connection::{Connection, READ_ERROR_PAUSE};
pub use connector::{connect, connect_with_options};
pub use correlation::{CorrelationTable, Delivery, Ticket};
pub use error::{ConnError, Result};
pub use events::EventStream;
