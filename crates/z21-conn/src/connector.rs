use crate::config::ConnOptions;
use crate::connection::Connection;
use crate::error::Result;

/// Connect to a command station with default options.
///
/// `addr` may omit the port; `21105` is assumed.
pub async fn connect(addr: &str) -> Result<Connection> {
    connect_with_options(addr, ConnOptions::default()).await
}

/// Connect with explicit options.
pub async fn connect_with_options(addr: &str, options: ConnOptions) -> Result<Connection> {
    Connection::open(addr, options).await
}
