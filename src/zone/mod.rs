//! Zone data model.
//!
//! A [`ZoneTable`] is an ordered list of [`ZoneEntry`] values, each pairing a compiled
//! [`DomainPattern`] with the [`ResourceRecord`]s served for names it matches. Tables are built
//! wholesale by [`synth::synthesize`] and published through a [`table::SharedZone`]; nothing
//! mutates a table once it has been published.
//!
//! Only `A`, `CNAME` and `PTR` records are modelled:
//!
//! ```json
//! { "domain": "^foo\\.docker\\.lan$",
//!   "records": [
//!     { "name": "foo", "type": "CNAME", "data": "foo.docker.lan", "ttl": 1800 },
//!     { "type": "A", "data": "10.0.0.5", "ttl": 1800 } ] }
//! ```

use crate::resolver::{Answer, Question};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::net::Ipv4Addr;
use trust_dns_server::client::rr::RecordType;

pub mod synth;
pub mod table;

pub use synth::synthesize;
pub use table::SharedZone;

/// TTL applied to answers whose record carries none.
pub const DEFAULT_TTL: u32 = 1800;

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
#[allow(clippy::upper_case_acronyms)]
pub enum RecordKind {
    A,
    CNAME,
    PTR,
}

impl RecordKind {
    /// Map a wire record type onto a servable kind. Anything other than `A`, `CNAME` or `PTR`
    /// is unsupported and yields `None`.
    #[must_use]
    pub fn from_record_type(record_type: RecordType) -> Option<Self> {
        match record_type {
            RecordType::A => Some(RecordKind::A),
            RecordType::CNAME => Some(RecordKind::CNAME),
            RecordType::PTR => Some(RecordKind::PTR),
            _ => None,
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RecordKind::A => "A",
            RecordKind::CNAME => "CNAME",
            RecordKind::PTR => "PTR",
        };
        f.write_str(s)
    }
}

/// Record payload. The record's kind follows from the variant, so kind and data always agree.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", content = "data")]
pub enum RecordData {
    #[serde(rename = "A")]
    A(Ipv4Addr),
    #[serde(rename = "CNAME")]
    Cname(String),
    #[serde(rename = "PTR")]
    Ptr(String),
}

impl RecordData {
    #[must_use]
    pub fn kind(&self) -> RecordKind {
        match self {
            RecordData::A(_) => RecordKind::A,
            RecordData::Cname(_) => RecordKind::CNAME,
            RecordData::Ptr(_) => RecordKind::PTR,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ResourceRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub data: RecordData,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,
}

impl ResourceRecord {
    #[must_use]
    pub fn new(data: RecordData) -> Self {
        ResourceRecord {
            name: None,
            data,
            ttl: None,
        }
    }

    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.ttl = Some(ttl);
        self
    }

    #[must_use]
    pub fn kind(&self) -> RecordKind {
        self.data.kind()
    }
}

/// An anchored, case-insensitive matcher for one fully-qualified name.
///
/// Built from a literal name: dots are escaped, so `foo.docker.lan` matches exactly that name
/// (in any letter case) and nothing else. A trailing root dot on the candidate is ignored.
#[derive(Clone)]
pub struct DomainPattern {
    regex: Regex,
}

impl DomainPattern {
    /// Compile a pattern for a literal domain name.
    #[must_use]
    pub fn literal(name: &str) -> Self {
        let pattern = format!("^{}$", regex::escape(name.trim_end_matches('.')));
        // NB: unwrap is safe, the pattern is a fully escaped literal.
        let regex = RegexBuilder::new(&pattern)
            .case_insensitive(true)
            .build()
            .unwrap();
        DomainPattern { regex }
    }

    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        self.regex.is_match(name.strip_suffix('.').unwrap_or(name))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

impl fmt::Debug for DomainPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DomainPattern").field(&self.as_str()).finish()
    }
}

impl PartialEq for DomainPattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for DomainPattern {}

impl Serialize for DomainPattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ZoneEntry {
    pub domain: DomainPattern,
    pub records: Vec<ResourceRecord>,
}

impl ZoneEntry {
    #[must_use]
    pub fn new(domain: &str, records: Vec<ResourceRecord>) -> Self {
        ZoneEntry {
            domain: DomainPattern::literal(domain),
            records,
        }
    }

    /// Answer a question this entry's domain has already matched: the first record of the
    /// requested kind, renamed to the queried name.
    #[must_use]
    pub fn answer(&self, question: &Question) -> Option<Answer> {
        let kind = question.kind?;
        self.records
            .iter()
            .find(|record| record.kind() == kind)
            .map(|record| Answer {
                name: question.name.clone(),
                data: record.data.clone(),
                ttl: record.ttl.unwrap_or(DEFAULT_TTL),
            })
    }
}

/// One complete view of the zone.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ZoneTable {
    pub version: u64,
    pub entries: Vec<ZoneEntry>,
}

impl ZoneTable {
    #[must_use]
    pub fn new(entries: Vec<ZoneEntry>) -> Self {
        ZoneTable {
            version: 0,
            entries,
        }
    }

    /// The first entry, in table order, whose domain matches `name`.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&ZoneEntry> {
        self.entries.iter().find(|entry| entry.domain.matches(name))
    }

    #[must_use]
    pub fn answer(&self, question: &Question) -> Option<Answer> {
        self.lookup(&question.name)?.answer(question)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The `in-addr.arpa` name for a reverse lookup of `ip`, e.g. `5.0.0.10.in-addr.arpa`.
#[must_use]
pub fn reverse_name(ip: Ipv4Addr) -> String {
    let [a, b, c, d] = ip.octets();
    format!("{d}.{c}.{b}.{a}.in-addr.arpa")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_is_anchored_and_case_insensitive() {
        let pattern = DomainPattern::literal("foo.docker.lan");
        assert!(pattern.matches("foo.docker.lan"));
        assert!(pattern.matches("FOO.Docker.LAN"));
        assert!(pattern.matches("foo.docker.lan."));
        assert!(!pattern.matches("xfoo.docker.lan"));
        assert!(!pattern.matches("foo.docker.lan.evil"));
        assert!(!pattern.matches("fooxdocker.lan"));
    }

    #[test]
    fn reverse_pattern_does_not_match_longer_octets() {
        let pattern = DomainPattern::literal(&reverse_name(Ipv4Addr::new(10, 0, 0, 5)));
        assert!(pattern.matches("5.0.0.10.in-addr.arpa"));
        assert!(!pattern.matches("15.0.0.10.in-addr.arpa"));
    }

    #[test]
    fn reverse_name_reverses_octets() {
        assert_eq!(
            reverse_name(Ipv4Addr::new(172, 17, 0, 2)),
            "2.0.17.172.in-addr.arpa"
        );
    }

    #[test]
    fn answer_uses_first_record_of_kind_and_defaults_ttl() {
        let entry = ZoneEntry::new(
            "foo.docker.lan",
            vec![
                ResourceRecord::new(RecordData::A(Ipv4Addr::new(10, 0, 0, 5))),
                ResourceRecord::new(RecordData::A(Ipv4Addr::new(10, 0, 0, 6))).with_ttl(60),
            ],
        );
        let answer = entry
            .answer(&Question::new("Foo.docker.lan", RecordKind::A))
            .unwrap();
        assert_eq!(answer.name, "Foo.docker.lan");
        assert_eq!(answer.data, RecordData::A(Ipv4Addr::new(10, 0, 0, 5)));
        assert_eq!(answer.ttl, DEFAULT_TTL);
        assert!(entry
            .answer(&Question::new("foo.docker.lan", RecordKind::PTR))
            .is_none());
    }

    #[test]
    fn table_lookup_takes_first_matching_entry() {
        let table = ZoneTable::new(vec![
            ZoneEntry::new(
                "dup.docker.lan",
                vec![ResourceRecord::new(RecordData::Cname("first".to_string()))],
            ),
            ZoneEntry::new(
                "dup.docker.lan",
                vec![ResourceRecord::new(RecordData::Cname("second".to_string()))],
            ),
        ]);
        let answer = table
            .answer(&Question::new("dup.docker.lan", RecordKind::CNAME))
            .unwrap();
        assert_eq!(answer.data, RecordData::Cname("first".to_string()));
    }

    #[test]
    fn record_serializes_like_a_zone_file_entry() {
        let record = ResourceRecord::new(RecordData::Cname("foo.docker.lan".to_string()))
            .named("foo")
            .with_ttl(1800);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"name": "foo", "type": "CNAME", "data": "foo.docker.lan", "ttl": 1800})
        );
    }

    #[test]
    fn record_kind_from_wire_type() {
        assert_eq!(RecordKind::from_record_type(RecordType::A), Some(RecordKind::A));
        assert_eq!(RecordKind::from_record_type(RecordType::PTR), Some(RecordKind::PTR));
        assert_eq!(RecordKind::from_record_type(RecordType::AAAA), None);
        assert_eq!(RecordKind::from_record_type(RecordType::MX), None);
    }

    #[test]
    fn record_kind_displays_wire_mnemonic() {
        assert_eq!(RecordKind::A.to_string(), "A");
        assert_eq!(RecordKind::CNAME.to_string(), "CNAME");
        assert_eq!(RecordKind::PTR.to_string(), "PTR");
    }
}
