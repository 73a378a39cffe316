//! Error types.

use std::net::IpAddr;
use trust_dns_server::proto::error::ProtoError;

/// Error enumerates the possible Dock Crab error states.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Returned when a configuration value (from the environment or a config file) can't be
    /// parsed. Holds the name of the offending setting and the rejected value.
    #[error("invalid value for {0}: \"{1}\"")]
    InvalidConfig(String, String),

    /// Returned when the [`Config::api_bind_addr`][`crate::config::Config::api_bind_addr`] is
    /// not a loopback address, or an address within a private network space. The
    /// [Dock Crab HTTP API][crate::api] exposes the full zone and lets callers force a refresh,
    /// so it is only ever served on private networks.
    #[error("API bind address ({0}) must be a loopback or private IP")]
    InsecureAPIBind(IpAddr),

    /// Returned when the container daemon answers the inventory request with a non-success
    /// HTTP status.
    #[error("inventory request failed with HTTP status {0}")]
    InventoryStatus(hyper::StatusCode),

    /// Returned when an in-process inventory has been told to fail.
    #[error("inventory unavailable: {0}")]
    InventoryUnavailable(String),

    /// Returned when the HTTP exchange with the container daemon fails at the transport level.
    #[error("inventory transport error")]
    InventoryTransport(#[from] hyper::Error),

    /// Returned when the inventory HTTP request can't be built.
    #[error("invalid inventory request")]
    InventoryRequest(#[from] hyper::http::Error),

    /// Returned when a generic IO error occurs, e.g. the daemon socket can't be connected.
    #[error("an IO error occurred")]
    IO(#[from] std::io::Error),

    /// Returned when processing JSON fails, either loading a
    /// [`Config`][crate::config::Config::try_from_file] from disk or decoding the container
    /// daemon's inventory listing.
    #[error("invalid JSON")]
    InvalidJSON(#[from] serde_json::Error),

    /// Returned when the Dock Crab DNS server encounters a generic DNS protocol error.
    #[error("DNS error")]
    DNSError(#[from] ProtoError),
}
