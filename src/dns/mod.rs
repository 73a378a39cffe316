//! UDP DNS server for the container zone.
//!
//! # A / CNAME / PTR
//!
//! Every query is resolved through the [`Resolver`][crate::resolver::Resolver] against the zone
//! published by the most recent successful refresh. For a running container `foo` attached with
//! `10.0.0.5`, and the default `docker.lan` domain:
//!
//! ```bash
//! ❯ dig @127.0.0.1 +short foo.docker.lan A
//! 10.0.0.5
//! ❯ dig @127.0.0.1 +short foo.docker.lan CNAME
//! foo.docker.lan.
//! ❯ dig @127.0.0.1 +short -x 10.0.0.5
//! foo.docker.lan.
//! ```
//!
//! `ns1.<domain>` always resolves to [`Config::dns_ip`][crate::config::Config::dns_ip], and the
//! reverse name of that address resolves to `ns1.<domain>`, whether or not any container is
//! running.
//!
//! Unknown names, and known names queried for a type they don't have, get an empty `NOERROR`
//! answer. Record types other than `A`, `CNAME` and `PTR` are treated the same way.
//!
//! ## SOA
//!
//! A `SOA` query for the zone apex returns the zone metadata built from
//! [`Config::soa`][crate::config::Config::soa]:
//!
//! ```bash
//! ❯ dig @127.0.0.1 +short docker.lan SOA
//! ns1.docker.lan. admin.docker.lan. 1792226400 7200 1800 1209600 600
//! ```
//!
//! _Note: The zone serial is the Unix time at which the query was answered._
//!
//! The same SOA record is attached to the authority section of empty answers for names in the
//! zone.
//!
//! ## One question per message
//!
//! The listener only accepts messages carrying exactly one question. A message with no
//! questions, or with several, is answered `FORMERR` before it reaches the [`Handler`]. Batches
//! of questions are only resolved in-process, through
//! [`Resolver::resolve`][crate::resolver::Resolver::resolve].

mod handlers;
pub mod server;

pub use handlers::Handler;
pub use server::{new, with_socket};
