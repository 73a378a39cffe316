//! Periodic zone rebuilds.
//!
//! Every refresh lists the inventory, synthesizes a complete [`ZoneTable`][crate::zone::ZoneTable]
//! from it and publishes the result. When the listing fails, or comes back empty, the table in
//! service is left as it is and the next tick tries again.
//!
//! Cycles never overlap: a cycle started from the HTTP API waits for one already in flight
//! from the interval loop (and vice versa), so tables are published in the order their
//! listings were taken.

use crate::config::Shared;
use crate::error::Error;
use crate::inventory::DynInventory;
use crate::zone::{synthesize, SharedZone};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{interval, MissedTickBehavior};

/// The result of one successful refresh cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refresh {
    /// A new table was published.
    Published { version: u64, entries: usize },
    /// The inventory listed no containers; the current table was kept.
    Retained,
}

#[derive(Clone)]
pub struct Refresher {
    config: Shared,
    inventory: DynInventory,
    zone: SharedZone,
    cycle: Arc<Mutex<()>>,
}

impl Refresher {
    #[must_use]
    pub fn new(config: Shared, inventory: DynInventory, zone: SharedZone) -> Self {
        Refresher {
            config,
            inventory,
            zone,
            cycle: Arc::new(Mutex::new(())),
        }
    }

    #[must_use]
    pub fn zone(&self) -> &SharedZone {
        &self.zone
    }

    /// Run one refresh cycle.
    ///
    /// # Errors
    ///
    /// Returns the inventory's error when the listing fails. Nothing is published in that case.
    pub async fn refresh_once(&self) -> Result<Refresh, Error> {
        // Held from listing to publish.
        let _cycle = self.cycle.lock().await;
        let containers = self.inventory.list().await?;
        if containers.is_empty() {
            tracing::debug!("inventory listed no containers, keeping current zone");
            return Ok(Refresh::Retained);
        }

        let table = synthesize(&containers, &self.config);
        let entries = table.len();
        let version = self.zone.publish(table);
        tracing::debug!(
            "published zone version {version}: {} container(s), {entries} entries",
            containers.len()
        );
        Ok(Refresh::Published { version, entries })
    }

    /// Refresh immediately and then every [`Config::refresh_interval`][crate::config::Config]
    /// for as long as the future is polled. Failed cycles are logged and retried on the next
    /// tick.
    pub async fn run(self) {
        let mut ticker = interval(self.config.refresh_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(err) = self.refresh_once().await {
                tracing::warn!("zone refresh failed, keeping current zone: {err}");
            }
        }
    }
}
