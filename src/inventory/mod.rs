//! Container inventory.
//!
//! An [`Inventory`] produces a point-in-time listing of running containers and the IPv4
//! addresses of their network attachments. Two implementations are provided,
//! [`docker::DockerInventory`] which asks a Docker daemon over its Unix socket, and
//! [`memory::InMemoryInventory`] whose contents are set in-process.

use crate::error::Error;
use std::net::Ipv4Addr;
use std::sync::Arc;

pub mod docker;
pub mod memory;

#[allow(clippy::module_name_repetitions)]
pub use docker::DockerInventory;
#[allow(clippy::module_name_repetitions)]
pub use memory::InMemoryInventory;

/// `DynInventory` is a type alias for an [`Inventory`] shared between the refresh task and the
/// HTTP API.
#[allow(clippy::module_name_repetitions)]
pub type DynInventory = Arc<dyn Inventory + Send + Sync>;

/// A running container as seen by one inventory listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerSnapshot {
    /// Unqualified container name, e.g. `foo` for the `foo.<domain>` records.
    pub name: String,
    pub networks: Vec<NetworkAttachment>,
}

/// One network a container is attached to. Every attachment carries a list of addresses, even
/// when the daemon reported a single endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkAttachment {
    pub network: String,
    pub addresses: Vec<Ipv4Addr>,
}

impl ContainerSnapshot {
    /// All addresses across all attachments, in attachment order.
    pub fn addresses(&self) -> impl Iterator<Item = Ipv4Addr> + '_ {
        self.networks
            .iter()
            .flat_map(|network| network.addresses.iter().copied())
    }
}

/// An async trait describing a source of [`ContainerSnapshot`] listings.
#[async_trait::async_trait]
pub trait Inventory {
    /// List the currently running containers.
    async fn list(&self) -> Result<Vec<ContainerSnapshot>, Error>;
}
