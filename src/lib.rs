//! Dock Crab
//!
//! A small authoritative DNS server for containers on a private domain.
//!
//! Dock Crab periodically lists the running containers of a [Docker] daemon and serves, under a
//! configurable domain (`docker.lan` by default):
//!
//! * an `A` record for each address of `<container>.<domain>`,
//! * a `CNAME` record of `<container>.<domain>` pointing at itself,
//! * a `PTR` record for the `in-addr.arpa` name of each container address.
//!
//! The zone is rebuilt from scratch on every refresh and swapped in atomically, so every DNS
//! request is answered from one complete, consistent view of the containers. If the daemon
//! can't be reached the previous zone keeps being served.
//!
//! [Docker]: https://docs.docker.com/engine/api/
//!
#![warn(clippy::pedantic)]

pub mod api;
pub mod config;
pub mod dns;
pub mod error;
pub mod inventory;
pub mod refresh;
pub mod resolver;
pub mod zone;

use crate::inventory::{docker, memory};
pub use api::new as new_http;
pub use config::{Config, Shared};
pub use dns::new as new_dns;
pub use docker::DockerInventory;
pub use memory::InMemoryInventory;
pub use refresh::{Refresh, Refresher};
pub use resolver::{Answer, Question, Resolver};
pub use zone::{SharedZone, ZoneTable};
