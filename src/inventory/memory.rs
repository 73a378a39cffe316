use crate::error::Error;
use crate::inventory::{ContainerSnapshot, Inventory};
use std::sync::Arc;
use tokio::sync::RwLock;

/// An in-process inventory. Clones share state, so a test (or an embedding application) can
/// keep a handle and change what the next [`Inventory::list`] call returns.
#[derive(Default, Debug, Clone)]
pub struct InMemoryInventory {
    state: Arc<RwLock<Listing>>,
}

#[derive(Debug)]
enum Listing {
    Containers(Vec<ContainerSnapshot>),
    Unavailable(String),
}

impl Default for Listing {
    fn default() -> Self {
        Listing::Containers(Vec::new())
    }
}

impl InMemoryInventory {
    #[must_use]
    pub fn new(containers: Vec<ContainerSnapshot>) -> Self {
        InMemoryInventory {
            state: Arc::new(RwLock::new(Listing::Containers(containers))),
        }
    }

    /// Replace the listed containers.
    pub async fn set(&self, containers: Vec<ContainerSnapshot>) {
        *self.state.write().await = Listing::Containers(containers);
    }

    /// Make every following [`Inventory::list`] call fail with `reason` until the next
    /// [`set`][InMemoryInventory::set].
    pub async fn fail(&self, reason: impl Into<String>) {
        *self.state.write().await = Listing::Unavailable(reason.into());
    }
}

#[async_trait::async_trait]
impl Inventory for InMemoryInventory {
    async fn list(&self) -> Result<Vec<ContainerSnapshot>, Error> {
        match &*self.state.read().await {
            Listing::Containers(containers) => Ok(containers.clone()),
            Listing::Unavailable(reason) => Err(Error::InventoryUnavailable(reason.clone())),
        }
    }
}
