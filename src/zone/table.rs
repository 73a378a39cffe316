//! Process-wide zone snapshot cell.

use crate::zone::ZoneTable;
use std::sync::Arc;
use tokio::sync::watch;

/// `SharedZone` holds the [`ZoneTable`] currently being served.
///
/// Writers [`publish`][SharedZone::publish] whole tables; readers take the current
/// [`Arc<ZoneTable>`] with [`current`][SharedZone::current] and keep resolving against it for as
/// long as they hold it, regardless of later publishes. Clones share the same cell.
#[derive(Clone, Debug)]
pub struct SharedZone {
    tx: Arc<watch::Sender<Arc<ZoneTable>>>,
}

impl SharedZone {
    /// Create a cell serving `initial` as version 0.
    #[must_use]
    pub fn new(initial: ZoneTable) -> Self {
        let (tx, _) = watch::channel(Arc::new(ZoneTable {
            version: 0,
            ..initial
        }));
        SharedZone { tx: Arc::new(tx) }
    }

    /// Atomically replace the served table, returning the version assigned to it.
    pub fn publish(&self, table: ZoneTable) -> u64 {
        let mut table = Some(table);
        let mut version = 0;
        self.tx.send_modify(|current| {
            version = current.version + 1;
            if let Some(table) = table.take() {
                *current = Arc::new(ZoneTable { version, ..table });
            }
        });
        version
    }

    /// The table in effect at the time of the call.
    #[must_use]
    pub fn current(&self) -> Arc<ZoneTable> {
        self.tx.borrow().clone()
    }

    /// A receiver notified on every publish.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Arc<ZoneTable>> {
        self.tx.subscribe()
    }
}
