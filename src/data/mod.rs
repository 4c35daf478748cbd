//! Breach feed data model
//!
//! Breach records are passed through untouched; the only field this crate
//! interprets is `ModifiedDate`, which drives the ordering of the feed.

pub mod upstream;

pub use upstream::{BreachSource, FetchError, UpstreamClient, HIBP_BREACHES_URL};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Name of the field used to order breach records
const MODIFIED_DATE_FIELD: &str = "ModifiedDate";

/// A single record from the breach feed
///
/// The record is kept as raw JSON so that fields added upstream are
/// republished without a code change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BreachRecord(pub Value);

impl BreachRecord {
    /// The record's `ModifiedDate`, or `""` when absent or not a string
    pub fn modified_date(&self) -> &str {
        self.0
            .get(MODIFIED_DATE_FIELD)
            .and_then(Value::as_str)
            .unwrap_or("")
    }
}

impl From<Value> for BreachRecord {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Sorts records newest-first by `ModifiedDate`
///
/// Comparison is lexicographic on the raw string. The sort is stable, so
/// records sharing a date keep their feed order.
pub fn sort_by_modified_desc(records: &mut [BreachRecord]) {
    records.sort_by(|a, b| b.modified_date().cmp(a.modified_date()));
}
