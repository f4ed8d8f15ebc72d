//! The normalized result types handed back to applications.

use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// A typed value obtained from an RDF term.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum Scalar {
    String(String),
    Integer(i64),
    Float(f64),
    /// Any numeric value; integral where the lexical form allows it
    Number(serde_json::Number),
    Boolean(bool),
    DateTime(DateTime<FixedOffset>),
}

impl Scalar {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Scalar::Integer(i) => Some(*i),
            Scalar::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Float(f) => Some(*f),
            Scalar::Integer(i) => Some(*i as f64),
            Scalar::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Scalar::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<&DateTime<FixedOffset>> {
        match self {
            Scalar::DateTime(dt) => Some(dt),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Scalar::String(s) => write!(f, "{}", s),
            Scalar::Integer(i) => write!(f, "{}", i),
            Scalar::Float(v) => write!(f, "{}", v),
            Scalar::Number(n) => write!(f, "{}", n),
            Scalar::Boolean(b) => write!(f, "{}", b),
            Scalar::DateTime(dt) => write!(f, "{}", dt.to_rfc3339()),
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::String(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::String(value)
    }
}

/// One normalized row, keyed by variable name.
pub type Record = BTreeMap<String, Scalar>;

/// Rows of typed values produced by [`crate::normalize::normalize`].
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ResultSet {
    pub total: usize,
    pub success: bool,
    pub records: Vec<Record>,
}

impl ResultSet {
    /// An empty, unsuccessful result set.
    pub fn empty() -> Self {
        Self {
            total: 0,
            success: false,
            records: vec![],
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Groups the records of `result_set` by the value of their `key` field.
///
/// The grouping field is removed from each grouped record. Records without `key` end
/// up under the empty string.
pub fn group_result_set(result_set: &ResultSet, key: &str) -> BTreeMap<String, Vec<Record>> {
    let mut groups: BTreeMap<String, Vec<Record>> = BTreeMap::new();
    for record in &result_set.records {
        let mut record = record.clone();
        let group = record
            .remove(key)
            .map(|v| v.to_string())
            .unwrap_or_default();
        groups.entry(group).or_default().push(record);
    }
    groups
}

/// Renames the groups listed in `names`; groups without an entry keep their key.
pub fn map_keys<V>(
    grouped: BTreeMap<String, V>,
    names: &HashMap<String, String>,
) -> BTreeMap<String, V> {
    grouped
        .into_iter()
        .map(|(key, value)| match names.get(&key) {
            Some(renamed) => (renamed.clone(), value),
            None => (key, value),
        })
        .collect()
}
