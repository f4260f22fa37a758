use std::collections::HashSet;
use std::ops::Range;

use tracing::{info, warn};

use crate::domain::Record;
use crate::error::CensusError;
use crate::metadata::{MetadataClient, fetch_documents};
use crate::normalize::extract_record;

/// The token ids a snapshot covers, plus the bound written into its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdRange {
    bound: u64,
    inclusive: bool,
}

impl IdRange {
    /// `0..=end`, for an explicit end id.
    pub fn through(end: u64) -> Self {
        Self {
            bound: end,
            inclusive: true,
        }
    }

    /// `0..total_supply`, for a fetched supply count.
    pub fn below(total_supply: u64) -> Self {
        Self {
            bound: total_supply,
            inclusive: false,
        }
    }

    pub fn bound(&self) -> u64 {
        self.bound
    }

    pub fn ids(&self) -> Range<u64> {
        if self.inclusive {
            0..self.bound.saturating_add(1)
        } else {
            0..self.bound
        }
    }

    pub fn contains(&self, token_id: u64) -> bool {
        self.ids().contains(&token_id)
    }
}

/// Normalizes a batch of fetched documents, dropping placeholders.
pub fn normalize_documents(
    documents: &[Option<serde_json::Value>],
) -> Result<Vec<Record>, CensusError> {
    let mut records = Vec::with_capacity(documents.len());
    for document in documents {
        if let Some(record) = extract_record(document.as_ref())? {
            records.push(record);
        }
    }
    Ok(records)
}

/// Ids of `range` with no record, ascending.
pub fn missing_ids(range: IdRange, records: &[Record]) -> Vec<u64> {
    let present: HashSet<u64> = records.iter().map(|record| record.token_id).collect();
    range.ids().filter(|id| !present.contains(id)).collect()
}

/// Re-fetches the ids missing from `records` once and merges what comes back.
///
/// Ids still missing after the second wave are left out. The result holds
/// each token id at most once and only ids inside `range`.
pub fn reconcile<C: MetadataClient>(
    client: &C,
    range: IdRange,
    records: Vec<Record>,
) -> Result<Vec<Record>, CensusError> {
    let missing = missing_ids(range, &records);
    if missing.is_empty() {
        info!("no missing ids, nothing to re-fetch");
        return Ok(merge(range, records, Vec::new()));
    }

    info!(count = missing.len(), ids = ?missing, "fetching missing values");
    let documents = fetch_documents(client, &missing);
    let replacements = normalize_documents(&documents)?;
    info!(
        ids = ?replacements.iter().map(|record| record.token_id).collect::<Vec<_>>(),
        "values fetched"
    );

    let merged = merge(range, records, replacements);
    let still_missing = missing_ids(range, &merged);
    if !still_missing.is_empty() {
        info!(count = still_missing.len(), ids = ?still_missing, "ids left out of the snapshot");
    }
    Ok(merged)
}

fn merge(range: IdRange, records: Vec<Record>, replacements: Vec<Record>) -> Vec<Record> {
    let mut seen = HashSet::new();
    let mut merged = Vec::with_capacity(records.len() + replacements.len());
    for record in records.into_iter().chain(replacements) {
        if !range.contains(record.token_id) {
            warn!(token_id = record.token_id, "record outside the requested range dropped");
            continue;
        }
        if seen.insert(record.token_id) {
            merged.push(record);
        } else {
            warn!(token_id = record.token_id, "duplicate token id dropped");
        }
    }
    merged
}
