//! Discriminator filtering of heterogeneous API records

use rustc_hash::FxHashSet;
use serde_json::Value;

/// Field holding the record kind on table descriptors
pub const DISCRIMINATOR: &str = "type";

/// Keeps records whose `type` is one of a fixed set of wanted values.
///
/// Records with no `type`, or a non-string one, are dropped.
#[derive(Debug, Clone)]
pub struct RecordFilter {
    wanted: FxHashSet<String>,
}

impl RecordFilter {
    pub fn new<I, S>(wanted: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            wanted: wanted.into_iter().map(Into::into).collect(),
        }
    }

    pub fn keep(&self, record: &Value) -> bool {
        record
            .get(DISCRIMINATOR)
            .and_then(Value::as_str)
            .is_some_and(|kind| self.wanted.contains(kind))
    }

    /// Matching records, in input order
    pub fn apply<'a>(&'a self, records: &'a [Value]) -> impl Iterator<Item = &'a Value> + 'a {
        records.iter().filter(move |r| self.keep(r))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tables_filter() -> RecordFilter {
        RecordFilter::new(["general-data", "hospitalization-by-age"])
    }

    #[test]
    fn keeps_wanted_types() {
        let f = tables_filter();
        assert!(f.keep(&json!({"id": "a", "type": "general-data"})));
        assert!(f.keep(&json!({"id": "b", "type": "hospitalization-by-age"})));
    }

    #[test]
    fn drops_other_types() {
        let f = tables_filter();
        assert!(!f.keep(&json!({"id": "c", "type": "procedures"})));
        assert!(!f.keep(&json!({"id": "d", "type": "General-Data"})));
    }

    #[test]
    fn drops_missing_or_non_string_type() {
        let f = tables_filter();
        assert!(!f.keep(&json!({"id": "e"})));
        assert!(!f.keep(&json!({"id": "f", "type": 3})));
        assert!(!f.keep(&json!(null)));
        assert!(!f.keep(&json!(["general-data"])));
    }

    #[test]
    fn apply_preserves_order() {
        let records = vec![
            json!({"id": "1", "type": "hospitalization-by-age"}),
            json!({"id": "2", "type": "demography"}),
            json!({"id": "3", "type": "general-data"}),
        ];
        let f = tables_filter();
        let ids: Vec<_> = f.apply(&records).map(|r| r["id"].as_str().unwrap()).collect();
        assert_eq!(ids, ["1", "3"]);
    }

    #[test]
    fn empty_filter_keeps_nothing() {
        let f = RecordFilter::new(Vec::<String>::new());
        assert!(!f.keep(&json!({"type": "general-data"})));
    }
}
