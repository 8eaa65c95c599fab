//! Listing Records and Search Responses
//!
//! Records are opaque JSON payloads whose schema belongs to the search API.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::range::PriceRange;

/// Response field carrying the query-wide result count.
pub const TOTAL_RESULT_COUNT_FIELD: &str = "totalResultCount";
/// Response field carrying the returned records.
pub const LISTINGS_FIELD: &str = "listings";

/// A single record returned by the search API.
pub type Record = Value;

/// Decoded top-level object of a search response.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchResponse {
    fields: Map<String, Value>,
}

impl SearchResponse {
    /// Wrap a decoded top-level object.
    #[must_use]
    pub const fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Build a response from any JSON value.
    ///
    /// Anything other than an object has no top-level fields and is
    /// treated as structurally empty.
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(fields) => Self { fields },
            _ => Self::default(),
        }
    }

    /// Response with a count and records, as the API shapes it.
    #[must_use]
    pub fn with_listings(total_result_count: u64, listings: Vec<Record>) -> Self {
        let mut fields = Map::new();
        fields.insert(
            TOTAL_RESULT_COUNT_FIELD.to_string(),
            Value::from(total_result_count),
        );
        fields.insert(LISTINGS_FIELD.to_string(), Value::Array(listings));
        Self { fields }
    }

    /// Whether the response carried no top-level fields at all.
    #[must_use]
    pub fn is_structurally_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Result count for the query; absent or malformed counts read as zero.
    #[must_use]
    pub fn total_result_count(&self) -> u64 {
        self.fields
            .get(TOTAL_RESULT_COUNT_FIELD)
            .and_then(Value::as_u64)
            .unwrap_or(0)
    }

    /// Returned records; absent or malformed lists read as empty.
    #[must_use]
    pub fn listings(&self) -> &[Record] {
        self.fields
            .get(LISTINGS_FIELD)
            .and_then(Value::as_array)
            .map_or(&[][..], Vec::as_slice)
    }

    /// Consume the response, keeping only the records.
    #[must_use]
    pub fn into_listings(mut self) -> Vec<Record> {
        match self.fields.remove(LISTINGS_FIELD) {
            Some(Value::Array(listings)) => listings,
            _ => Vec::new(),
        }
    }
}

/// Records fetched for one sub-range.
#[derive(Debug, Clone, PartialEq)]
pub struct SubqueryResult {
    /// The sub-range that was fetched.
    pub range: PriceRange,
    /// Records returned by the last attempt.
    pub records: Vec<Record>,
    /// Number of requests issued (first call plus retries).
    pub attempts: u32,
    /// Whether every attempt came back empty or failed.
    pub exhausted: bool,
}

/// Union of all sub-range results, handed to the caller.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregateResult {
    /// All records, in no particular order.
    pub records: Vec<Record>,
    /// Number of sub-ranges fetched.
    pub subqueries: usize,
    /// Sub-ranges whose retries were exhausted.
    pub degraded_ranges: Vec<PriceRange>,
}

impl AggregateResult {
    /// Merge per-range results into one aggregate.
    #[must_use]
    pub fn merge(results: Vec<SubqueryResult>) -> Self {
        let subqueries = results.len();
        let total: usize = results.iter().map(|r| r.records.len()).sum();
        let mut records = Vec::with_capacity(total);
        let mut degraded_ranges = Vec::new();

        for result in results {
            if result.exhausted {
                degraded_ranges.push(result.range);
            }
            records.extend(result.records);
        }

        Self {
            records,
            subqueries,
            degraded_ranges,
        }
    }

    /// Number of records collected.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no records were collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn empty_object_is_structurally_empty() {
        let response: SearchResponse = serde_json::from_value(json!({})).unwrap();
        assert!(response.is_structurally_empty());
        assert_eq!(response.total_result_count(), 0);
        assert!(response.listings().is_empty());
    }

    #[test]
    fn non_object_is_structurally_empty() {
        assert!(SearchResponse::from_value(json!([1, 2])).is_structurally_empty());
        assert!(SearchResponse::from_value(Value::Null).is_structurally_empty());
    }

    #[test]
    fn count_without_listings() {
        let response = SearchResponse::from_value(json!({ "totalResultCount": 50_000 }));
        assert!(!response.is_structurally_empty());
        assert_eq!(response.total_result_count(), 50_000);
        assert!(response.listings().is_empty());
    }

    #[test]
    fn listings_are_extracted() {
        let response = SearchResponse::from_value(json!({
            "totalResultCount": 2,
            "listings": [{ "id": 1 }, { "id": 2 }],
        }));
        assert_eq!(response.listings().len(), 2);
        assert_eq!(response.into_listings()[1]["id"], 2);
    }

    #[test]
    fn merge_collects_records_and_degraded_ranges() {
        let ok = SubqueryResult {
            range: PriceRange::new(0, 9).unwrap(),
            records: vec![json!({ "id": 1 }), json!({ "id": 2 })],
            attempts: 1,
            exhausted: false,
        };
        let degraded = SubqueryResult {
            range: PriceRange::new(10, 19).unwrap(),
            records: vec![],
            attempts: 6,
            exhausted: true,
        };

        let aggregate = AggregateResult::merge(vec![ok, degraded]);
        assert_eq!(aggregate.len(), 2);
        assert_eq!(aggregate.subqueries, 2);
        assert_eq!(
            aggregate.degraded_ranges,
            vec![PriceRange::new(10, 19).unwrap()]
        );
    }
}
