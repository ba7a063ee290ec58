//! Accessors for the two response envelope shapes
//!
//! Flat: `{"meta": {"count": N}, "data": [...]}` (benefit listing) and
//! detail pages, whose records sit at `data.attributes.data`.
//! Nested: `{"data": {"attributes": {"years": [{"tables": [...]}]}}}`
//! (table index).

use serde_json::Value;

use crate::error::FetchError;

/// Records of the benefit listing
pub const FLAT_RECORDS: &str = "/data";

/// Records of the general-data and hospitalization-by-age detail endpoints
pub const NESTED_RECORDS: &str = "/data/attributes/data";

/// Total result count from `meta.count`
pub fn count(body: &Value) -> Result<u64, FetchError> {
    body.pointer("/meta/count")
        .and_then(Value::as_u64)
        .ok_or_else(|| FetchError::malformed("missing or non-integer meta.count"))
}

/// Array of records at a JSON pointer (see [`FLAT_RECORDS`], [`NESTED_RECORDS`])
pub fn records<'a>(body: &'a Value, pointer: &str) -> Result<&'a [Value], FetchError> {
    body.pointer(pointer)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .ok_or_else(|| FetchError::malformed(format!("no array at {pointer}")))
}

/// Table descriptors of the *first* year object in a table-index response.
///
/// The API is queried per year, but only `years[0]` is read, whatever year
/// was requested.
pub fn first_year_tables(body: &Value) -> Result<&[Value], FetchError> {
    body.pointer("/data/attributes/years/0/tables")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .ok_or_else(|| FetchError::malformed("no data.attributes.years[0].tables"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn count_reads_meta() {
        let body = json!({"meta": {"count": 137}, "data": []});
        assert_eq!(count(&body).unwrap(), 137);
    }

    #[test]
    fn count_missing_is_malformed() {
        let body = json!({"data": []});
        assert!(matches!(count(&body), Err(FetchError::MalformedResponse(_))));
    }

    #[test]
    fn count_negative_is_malformed() {
        let body = json!({"meta": {"count": -1}});
        assert!(count(&body).is_err());
    }

    #[test]
    fn flat_records() {
        let body = json!({"meta": {"count": 2}, "data": [{"name": "a"}, {"name": "b"}]});
        let recs = records(&body, FLAT_RECORDS).unwrap();
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[1]["name"], "b");
    }

    #[test]
    fn nested_records() {
        let body = json!({
            "meta": {"count": 1},
            "data": {"attributes": {"data": [{"year": 2019}]}}
        });
        let recs = records(&body, NESTED_RECORDS).unwrap();
        assert_eq!(recs[0]["year"], 2019);
    }

    #[test]
    fn records_wrong_shape_is_malformed() {
        let body = json!({"data": {"attributes": {}}});
        assert!(records(&body, NESTED_RECORDS).is_err());
        assert!(records(&body, FLAT_RECORDS).is_err());
    }

    #[test]
    fn first_year_only() {
        let body = json!({"data": {"attributes": {"years": [
            {"year": 2020, "tables": [{"id": "t20", "type": "general-data"}]},
            {"year": 2019, "tables": [{"id": "t19", "type": "general-data"}]}
        ]}}});
        let tables = first_year_tables(&body).unwrap();
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0]["id"], "t20");
    }

    #[test]
    fn empty_years_is_malformed() {
        let body = json!({"data": {"attributes": {"years": []}}});
        assert!(matches!(
            first_year_tables(&body),
            Err(FetchError::MalformedResponse(_))
        ));
    }

    #[test]
    fn null_data_is_malformed() {
        let body = json!({"data": null});
        assert!(first_year_tables(&body).is_err());
    }
}
