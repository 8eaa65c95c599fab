//! Search Query Value Object
//!
//! A set of pass-through filter parameters plus the names of the parameters
//! that carry the partitioned dimension and the per-request record cap.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::range::PriceRange;

/// Default parameter carrying the dimension's lower bound.
pub const DEFAULT_LOW_PARAM: &str = "minPrice";
/// Default parameter carrying the dimension's upper bound.
pub const DEFAULT_HIGH_PARAM: &str = "maxPrice";
/// Parameter carrying the per-request record cap.
pub const NUM_RECORDS_PARAM: &str = "numRecords";

/// Names of the query parameters that bound the partitioned dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeDimension {
    /// Lower-bound parameter (e.g. `minPrice`, `startYear`).
    pub low_param: String,
    /// Upper-bound parameter (e.g. `maxPrice`, `endYear`).
    pub high_param: String,
}

impl Default for RangeDimension {
    fn default() -> Self {
        Self {
            low_param: DEFAULT_LOW_PARAM.to_string(),
            high_param: DEFAULT_HIGH_PARAM.to_string(),
        }
    }
}

/// Search request parameters.
///
/// Parameters are kept ordered so the encoded query string is stable.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchQuery {
    params: BTreeMap<String, String>,
    dimension: RangeDimension,
}

impl SearchQuery {
    /// Create a query from base filter parameters.
    #[must_use]
    pub const fn new(params: BTreeMap<String, String>, dimension: RangeDimension) -> Self {
        Self { params, dimension }
    }

    /// The truck search the fetcher runs when nothing else is configured.
    #[must_use]
    pub fn default_truck_search() -> Self {
        let params = [
            ("bodyStyleSubtypeCode", "FULLSIZE_CREW,COMPACT_CREW"),
            ("listingType", "USED,CERTIFIED,3P_CERT"),
            ("searchRadius", "500"),
            ("vehicleStyleCode", "TRUCKS"),
            ("zip", "66501"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self::new(params, RangeDimension::default())
    }

    /// Set (or replace) a single parameter.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.insert(key.into(), value.to_string());
        self
    }

    /// Copy of this query restricted to `range`.
    #[must_use]
    pub fn with_range(&self, range: PriceRange) -> Self {
        self.clone()
            .with_param(self.dimension.low_param.clone(), range.low())
            .with_param(self.dimension.high_param.clone(), range.high())
    }

    /// Copy of this query with the record cap set.
    #[must_use]
    pub fn with_num_records(&self, num_records: u64) -> Self {
        self.clone().with_param(NUM_RECORDS_PARAM, num_records)
    }

    /// Count-only request for `range` (`numRecords = 0`).
    #[must_use]
    pub fn probe_for(&self, range: PriceRange) -> Self {
        self.with_range(range).with_num_records(0)
    }

    /// Look up a parameter value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// All parameters in key order.
    #[must_use]
    pub const fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    /// Names of the bounding dimension parameters.
    #[must_use]
    pub const fn dimension(&self) -> &RangeDimension {
        &self.dimension
    }

    /// The range this query is restricted to, if both bounds parse.
    #[must_use]
    pub fn range(&self) -> Option<PriceRange> {
        let low = self.get(&self.dimension.low_param)?.parse().ok()?;
        let high = self.get(&self.dimension.high_param)?.parse().ok()?;
        PriceRange::new(low, high).ok()
    }

    /// The record cap, if set.
    #[must_use]
    pub fn num_records(&self) -> Option<u64> {
        self.get(NUM_RECORDS_PARAM)?.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_truck_search_params() {
        let query = SearchQuery::default_truck_search();
        assert_eq!(query.get("vehicleStyleCode"), Some("TRUCKS"));
        assert_eq!(query.get("zip"), Some("66501"));
        assert!(query.range().is_none());
        assert!(query.num_records().is_none());
    }

    #[test]
    fn probe_query_sets_range_and_zero_records() {
        let range = PriceRange::new(0, 10_465).unwrap();
        let probe = SearchQuery::default_truck_search().probe_for(range);

        assert_eq!(probe.get("minPrice"), Some("0"));
        assert_eq!(probe.get("maxPrice"), Some("10465"));
        assert_eq!(probe.num_records(), Some(0));
        assert_eq!(probe.range(), Some(range));
    }

    #[test]
    fn with_range_does_not_mutate_base() {
        let base = SearchQuery::default_truck_search();
        let _ = base.with_range(PriceRange::new(1, 2).unwrap());
        assert!(base.get("minPrice").is_none());
    }

    #[test]
    fn custom_dimension_names() {
        let dimension = RangeDimension {
            low_param: "startYear".to_string(),
            high_param: "endYear".to_string(),
        };
        let query = SearchQuery::new(BTreeMap::new(), dimension)
            .with_range(PriceRange::new(2010, 2015).unwrap());

        assert_eq!(query.get("startYear"), Some("2010"));
        assert_eq!(query.get("endYear"), Some("2015"));
        assert!(query.get("minPrice").is_none());
    }

    #[test]
    fn range_parse_rejects_inverted_bounds() {
        let query = SearchQuery::default()
            .with_param("minPrice", 10)
            .with_param("maxPrice", 5);
        assert!(query.range().is_none());
    }
}
