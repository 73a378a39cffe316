//! Build a complete [`ZoneTable`] from one inventory snapshot.

use crate::config::Config;
use crate::inventory::ContainerSnapshot;
use crate::zone::{reverse_name, RecordData, ResourceRecord, ZoneEntry, ZoneTable, DEFAULT_TTL};
use std::net::Ipv4Addr;

/// Synthesize the zone for `containers`.
///
/// The table always starts with the resolver's own records: the reverse entry for
/// [`Config::dns_ip`] and the `ns1.<domain>` entry. Each container then contributes one reverse
/// entry per address, followed by a single forward entry holding its `CNAME` and every `A`
/// record. Output order follows input order, so the same inventory always yields the same
/// table.
#[must_use]
pub fn synthesize(containers: &[ContainerSnapshot], config: &Config) -> ZoneTable {
    let mut entries = infrastructure_entries(config);
    for container in containers {
        container_entries(container, config, &mut entries);
    }
    ZoneTable::new(entries)
}

fn infrastructure_entries(config: &Config) -> Vec<ZoneEntry> {
    let ns_domain = config.ns_domain();
    vec![
        ZoneEntry::new(
            &reverse_name(config.dns_ip),
            vec![ResourceRecord::new(RecordData::Ptr(ns_domain.clone()))],
        ),
        ZoneEntry::new(
            &ns_domain,
            vec![
                ResourceRecord::new(RecordData::Cname(ns_domain.clone()))
                    .named("ns1")
                    .with_ttl(DEFAULT_TTL),
                ResourceRecord::new(RecordData::A(config.dns_ip)).with_ttl(DEFAULT_TTL),
            ],
        ),
    ]
}

fn container_entries(container: &ContainerSnapshot, config: &Config, entries: &mut Vec<ZoneEntry>) {
    let fqdn = config.qualify(&container.name);
    let mut records = vec![ResourceRecord::new(RecordData::Cname(fqdn.clone()))
        .named(container.name.clone())
        .with_ttl(DEFAULT_TTL)];

    for ip in container.addresses() {
        records.push(ResourceRecord::new(RecordData::A(ip)).with_ttl(DEFAULT_TTL));
        entries.push(reverse_entry(ip, &fqdn));
    }

    tracing::trace!("synthesized {fqdn} with {} address(es)", records.len() - 1);
    entries.push(ZoneEntry::new(&fqdn, records));
}

fn reverse_entry(ip: Ipv4Addr, fqdn: &str) -> ZoneEntry {
    ZoneEntry::new(
        &reverse_name(ip),
        vec![ResourceRecord::new(RecordData::Ptr(fqdn.to_string()))],
    )
}
