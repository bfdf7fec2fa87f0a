//! Raw, unvalidated index snapshot as produced by the external index builder.
//!
//! Field names follow the Sphinx `searchindex.js` layout. Nothing here is
//! checked beyond what serde enforces; [`crate::Snapshot::load`] turns a
//! `RawIndex` into a validated snapshot.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawIndex {
    pub docnames: Option<Vec<String>>,
    pub filenames: Option<Vec<String>>,
    pub titles: Option<Vec<String>>,
    pub terms: Option<BTreeMap<String, RawPostings>>,
    pub titleterms: Option<BTreeMap<String, RawPostings>>,
    #[serde(default)]
    pub objects: BTreeMap<String, RawObjects>,
    /// type index -> `"domain:role"`, e.g. `"py:function"`
    #[serde(default)]
    pub objtypes: BTreeMap<String, String>,
    /// type index -> `[domain, role, display name]`
    #[serde(default)]
    pub objnames: BTreeMap<String, Vec<String>>,
}

impl RawIndex {
    /// Parse a JSON document in the raw snapshot layout.
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::malformed(format!("invalid index json: {e}")))
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| Error::malformed(format!("invalid index json: {e}")))
    }
}

/// A posting list as it appears on the wire.
///
/// Sphinx writes a bare index when a term occurs in a single document and an
/// array otherwise. Builders that carry weights use `[doc, weight]` pairs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawPostings {
    One(u32),
    Many(Vec<u32>),
    Weighted(Vec<(u32, f32)>),
}

impl RawPostings {
    /// Flatten into `(doc, weight)` pairs, defaulting the weight to 1.0.
    pub fn into_pairs(self) -> Vec<(u32, f32)> {
        match self {
            RawPostings::One(doc) => vec![(doc, 1.0)],
            RawPostings::Many(docs) => docs.into_iter().map(|d| (d, 1.0)).collect(),
            RawPostings::Weighted(pairs) => pairs,
        }
    }
}

/// `[doc, type, priority, anchor]`
pub type RawObjectRef = (u32, u32, i32, String);
/// `[doc, type, priority, anchor, name]`
pub type RawObjectRow = (u32, u32, i32, String, String);

/// Objects registered under one prefix (module or namespace).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawObjects {
    Named(BTreeMap<String, RawObjectRef>),
    Rows(Vec<RawObjectRow>),
}

impl RawObjects {
    pub fn into_rows(self) -> Vec<RawObjectRow> {
        match self {
            RawObjects::Named(map) => map
                .into_iter()
                .map(|(name, (doc, ty, prio, anchor))| (doc, ty, prio, anchor, name))
                .collect(),
            RawObjects::Rows(rows) => rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn postings_accept_all_wire_shapes() {
        let raw: BTreeMap<String, RawPostings> =
            serde_json::from_str(r#"{"a": 3, "b": [0, 2], "c": [[1, 2.5]], "d": []}"#).unwrap();
        assert_eq!(raw["a"].clone().into_pairs(), vec![(3, 1.0)]);
        assert_eq!(raw["b"].clone().into_pairs(), vec![(0, 1.0), (2, 1.0)]);
        assert_eq!(raw["c"].clone().into_pairs(), vec![(1, 2.5)]);
        assert!(raw["d"].clone().into_pairs().is_empty());
    }

    #[test]
    fn objects_accept_map_and_row_layouts() {
        let named: RawObjects = serde_json::from_str(r#"{"run": [1, 0, 1, ""]}"#).unwrap();
        assert_eq!(named.into_rows(), vec![(1, 0, 1, String::new(), "run".to_string())]);

        let rows: RawObjects = serde_json::from_str(r#"[[2, 1, 0, "-", "Model"]]"#).unwrap();
        assert_eq!(rows.into_rows(), vec![(2, 1, 0, "-".to_string(), "Model".to_string())]);
    }

    #[test]
    fn missing_tables_deserialize_as_none() {
        let raw = RawIndex::from_json_str(r#"{"docnames": ["a"]}"#).unwrap();
        assert!(raw.titles.is_none());
        assert!(raw.terms.is_none());
        assert!(raw.objects.is_empty());
    }

    #[test]
    fn negative_ids_are_malformed() {
        let err = RawIndex::from_json_str(r#"{"terms": {"x": [-1]}}"#).unwrap_err();
        assert!(matches!(err, Error::MalformedIndex(_)));
    }
}
