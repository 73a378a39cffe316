use crate::resolver::Answer;
use crate::zone::RecordKind;
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub(super) struct ResolveRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: RecordKind,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub(super) struct ResolveResult {
    pub version: u64,
    pub answers: Vec<Answer>,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub(super) enum RefreshResult {
    Published { version: u64, entries: usize },
    Retained { version: u64 },
}
