//! HTTP API for inspecting the served zone.
//!
//! Only started when [`Config::api_bind_addr`][crate::config::Config::api_bind_addr] is set, and
//! only on loopback or private addresses.
//!
//! # API Endpoints
//!
//! ## `/healthcheck` (GET)
//!
//!   Returns HTTP 200 (OK) and the JSON body `{"ok":"healthy","version":3}` when the service is
//!   operational, where `version` is the version of the zone currently served.
//!
//! ## `/zone` (GET)
//!
//!   Returns the zone currently served, in table order:
//!
//!   ```json
//!   { "version": 3,
//!     "entries": [
//!       { "domain": "^ns1\\.docker\\.lan$",
//!         "records": [ { "name": "ns1", "type": "CNAME", "data": "ns1.docker.lan", "ttl": 1800 },
//!                      { "type": "A", "data": "0.0.0.0", "ttl": 1800 } ] } ] }
//!   ```
//!
//! ## `/resolve?name=<name>&type=<A|CNAME|PTR>` (GET)
//!
//!   Resolves one question exactly as the DNS server would:
//!
//!   ```json
//!   { "version": 3,
//!     "answers": [ { "name": "foo.docker.lan", "type": "A", "data": "10.0.0.5", "ttl": 1800 } ] }
//!   ```
//!
//! ## `/refresh` (POST)
//!
//!   Runs one refresh cycle immediately. Returns
//!   `{"outcome":"published","version":4,"entries":6}` when a new zone was published,
//!   `{"outcome":"retained","version":3}` when the inventory was empty, and HTTP 502 (Bad
//!   Gateway) with an `error` body when the inventory could not be listed.

mod api_error;
mod model;
mod routes;
pub mod server;

pub use server::new;
