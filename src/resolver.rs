//! Query resolution against the published zone.
//!
//! Each call to [`Resolver::resolve`] reads one [`ZoneTable`] snapshot and answers every
//! question in the request from it, so a refresh that publishes mid-request can never produce a
//! response mixing two tables.
//!
//! For each question the first entry (in table order) whose domain matches the queried name is
//! selected, and within it the first record of the requested kind. Questions that match no
//! entry, or whose entry has no record of the requested kind, simply produce no answer.

use crate::zone::{RecordData, RecordKind, SharedZone, ZoneTable};
use serde::Serialize;
use std::sync::Arc;

/// One question of a DNS request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub name: String,
    /// The requested kind, or `None` for a record type this server doesn't serve.
    pub kind: Option<RecordKind>,
}

impl Question {
    #[must_use]
    pub fn new(name: impl Into<String>, kind: RecordKind) -> Self {
        Question {
            name: name.into(),
            kind: Some(kind),
        }
    }

    #[must_use]
    pub fn unsupported(name: impl Into<String>) -> Self {
        Question {
            name: name.into(),
            kind: None,
        }
    }
}

/// A resolved record, owned by the caller and detached from the zone it came from.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub name: String,
    #[serde(flatten)]
    pub data: RecordData,
    pub ttl: u32,
}

impl Answer {
    #[must_use]
    pub fn kind(&self) -> RecordKind {
        self.data.kind()
    }
}

#[derive(Clone, Debug)]
pub struct Resolver {
    zone: SharedZone,
}

impl Resolver {
    #[must_use]
    pub fn new(zone: SharedZone) -> Self {
        Resolver { zone }
    }

    #[must_use]
    pub fn zone(&self) -> &SharedZone {
        &self.zone
    }

    /// Resolve `questions` against the current snapshot. Answers keep question order.
    #[must_use]
    pub fn resolve(&self, questions: &[Question]) -> Vec<Answer> {
        let snapshot: Arc<ZoneTable> = self.zone.current();
        let answers = Self::resolve_in(&snapshot, questions);
        tracing::debug!(
            "resolved {}/{} question(s) against zone version {}",
            answers.len(),
            questions.len(),
            snapshot.version
        );
        answers
    }

    /// Resolve `questions` against a specific table.
    #[must_use]
    pub fn resolve_in(table: &ZoneTable, questions: &[Question]) -> Vec<Answer> {
        questions
            .iter()
            .filter_map(|question| {
                let answer = table.answer(question);
                if answer.is_none() {
                    match question.kind {
                        Some(kind) => tracing::trace!("no {kind} record for {}", question.name),
                        None => tracing::trace!("unsupported record type for {}", question.name),
                    }
                }
                answer
            })
            .collect()
    }
}
