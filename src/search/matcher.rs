//! Query resolution against a Record Store.
//!
//! Resolution order:
//! 1. exact normalized identifier (always wins)
//! 2. exact normalized display name
//! 3. substring of identifier or display name
//!
//! Ambiguity is a result, not an error: callers decide how to present it.

use serde::Serialize;

use crate::models::Record;
use crate::search::store::{Entry, RecordStore};
use crate::utils::normalize;

/// Upper bound on suggestions returned at once.
pub const MAX_SUGGESTIONS: usize = 25;

/// Outcome of resolving a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchResult<'a> {
    Found(&'a Record),
    NotFound,
    /// Two or more candidates, in dataset order
    Ambiguous(Vec<&'a Record>),
}

impl<'a> MatchResult<'a> {
    pub fn found(&self) -> Option<&'a Record> {
        match self {
            MatchResult::Found(record) => Some(*record),
            _ => None,
        }
    }

    fn from_candidates(mut candidates: Vec<&'a Record>) -> Self {
        match candidates.len() {
            0 => MatchResult::NotFound,
            1 => MatchResult::Found(candidates.remove(0)),
            _ => MatchResult::Ambiguous(candidates),
        }
    }
}

/// A completion candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Suggestion {
    /// Display name
    pub display: String,
    /// Dataset key
    pub key: String,
}

pub fn lookup<'a>(store: &'a RecordStore, query: &str) -> MatchResult<'a> {
    let query = normalize(query);
    if query.is_empty() {
        return MatchResult::NotFound;
    }
    let entries = store.entries();

    if let Some(entry) = entries.iter().find(|e| e.norm_id == query) {
        return MatchResult::Found(&entry.record);
    }

    let named: Vec<&Record> = entries
        .iter()
        .filter(|e| e.norm_name == query)
        .map(|e| &e.record)
        .collect();
    if !named.is_empty() {
        return MatchResult::from_candidates(named);
    }

    MatchResult::from_candidates(
        entries
            .iter()
            .filter(|e| e.norm_id.contains(&query) || e.norm_name.contains(&query))
            .map(|e| &e.record)
            .collect(),
    )
}

/// Ranked completion candidates for `prefix`, at most `limit` (capped at 25).
///
/// Exact matches rank first, then prefix matches, then substring matches;
/// ties keep dataset order. An empty prefix lists the first Records.
pub fn suggest(store: &RecordStore, prefix: &str, limit: usize) -> Vec<Suggestion> {
    let limit = limit.min(MAX_SUGGESTIONS);
    let prefix = normalize(prefix);
    if prefix.is_empty() {
        return store
            .entries()
            .iter()
            .take(limit)
            .map(suggestion)
            .collect();
    }

    let mut ranked: Vec<(u8, &Entry)> = store
        .entries()
        .iter()
        .filter_map(|e| tier(e, &prefix).map(|t| (t, e)))
        .collect();
    ranked.sort_by_key(|(t, _)| *t);

    ranked
        .into_iter()
        .take(limit)
        .map(|(_, e)| suggestion(e))
        .collect()
}

fn suggestion(entry: &Entry) -> Suggestion {
    Suggestion {
        display: entry.record.display_name().to_string(),
        key: entry.key.clone(),
    }
}

fn tier(entry: &Entry, prefix: &str) -> Option<u8> {
    let fields = [entry.norm_id.as_str(), entry.norm_name.as_str()];
    if fields.iter().any(|f| *f == prefix) {
        Some(0)
    } else if fields.iter().any(|f| f.starts_with(prefix)) {
        Some(1)
    } else if fields.iter().any(|f| f.contains(prefix)) {
        Some(2)
    } else {
        None
    }
}
