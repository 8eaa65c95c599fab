//! Base query and bounding range configuration.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::{BoundingSpec, RangeDimension, RangeError, SearchQuery};

/// Query parameter value as written in YAML.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ParamValue {
    /// Integer parameter.
    Int(i64),
    /// Decimal parameter.
    Float(f64),
    /// Boolean parameter.
    Bool(bool),
    /// String parameter.
    String(String),
    /// List, sent comma-separated.
    List(Vec<ParamValue>),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::String(v) => f.write_str(v),
            Self::List(values) => {
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{value}")?;
                }
                Ok(())
            }
        }
    }
}

/// What to search for and over which range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Pass-through filter parameters.
    #[serde(default = "default_params")]
    pub params: BTreeMap<String, ParamValue>,
    /// Parameter carrying the lower bound.
    #[serde(default = "default_low_param")]
    pub low_param: String,
    /// Parameter carrying the upper bound.
    #[serde(default = "default_high_param")]
    pub high_param: String,
    /// Inclusive lower bound of the bounding range.
    #[serde(default)]
    pub low: i64,
    /// Inclusive upper bound of the bounding range.
    #[serde(default = "default_high")]
    pub high: i64,
    /// Records the API reliably returns per request.
    #[serde(default = "default_threshold")]
    pub threshold: u64,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            params: default_params(),
            low_param: default_low_param(),
            high_param: default_high_param(),
            low: 0,
            high: default_high(),
            threshold: default_threshold(),
        }
    }
}

impl QueryConfig {
    /// Base query without range or record cap.
    #[must_use]
    pub fn search_query(&self) -> SearchQuery {
        let params = self
            .params
            .iter()
            .map(|(k, v)| (k.clone(), v.to_string()))
            .collect();
        let dimension = RangeDimension {
            low_param: self.low_param.clone(),
            high_param: self.high_param.clone(),
        };
        SearchQuery::new(params, dimension)
    }

    /// Bounding range and threshold.
    pub const fn bounds(&self) -> Result<BoundingSpec, RangeError> {
        BoundingSpec::new(self.low, self.high, self.threshold)
    }
}

fn default_params() -> BTreeMap<String, ParamValue> {
    SearchQuery::default_truck_search()
        .params()
        .iter()
        .map(|(k, v)| (k.clone(), ParamValue::String(v.clone())))
        .collect()
}

fn default_low_param() -> String {
    RangeDimension::default().low_param
}

fn default_high_param() -> String {
    RangeDimension::default().high_param
}

const fn default_high() -> i64 {
    150_000
}

const fn default_threshold() -> u64 {
    3800
}
