//! Output row schemas, one per stage

use nfzstat_core::Row;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One CSV cell projected from any JSON scalar.
///
/// Strings pass through, numbers and booleans use their JSON text, `null`
/// becomes an empty cell. No type checking: the API is not validated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Cell(String);

impl Cell {
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Null => Self(String::new()),
            Value::String(s) => Self(s.clone()),
            other => Self(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl<'de> Deserialize<'de> for Cell {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(|v| Self::from_value(&v))
    }
}

/// Stage 1 output: `benefits_data.csv`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BenefitRow {
    pub name: String,
}

impl Row for BenefitRow {
    const COLUMNS: &'static [&'static str] = &["name"];
}

/// Strip the `*` marker and surrounding whitespace from a benefit name
pub fn clean_benefit_name(raw: &str) -> String {
    raw.replace('*', "").trim().to_string()
}

/// Stage 2 output: `index_of_tables_data.csv`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableRow {
    pub table_id: String,
    pub table_type: String,
}

impl Row for TableRow {
    const COLUMNS: &'static [&'static str] = &["table_id", "table_type"];
}

/// Stage 3a output: one row per (table, branch, year)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct GeneralDataRecord {
    pub year: Cell,
    pub branch: Cell,
    pub name: Cell,
    pub number_of_patients: Cell,
    pub number_of_hospitalizations: Cell,
    pub ratio_of_rehospitalizations: Cell,
    pub percentage: Cell,
    pub percentage_of_sections: Cell,
    pub duration_of_hospitalization_mediana: Cell,
    pub duration_of_hospitalization_mode: Cell,
    pub average_value_of_hospitalization: Cell,
    pub average_value_of_hospitalization_points: Cell,
    pub average_value_of_drg: Cell,
    pub average_value_of_drg_points: Cell,
}

impl Row for GeneralDataRecord {
    const COLUMNS: &'static [&'static str] = &[
        "year",
        "branch",
        "name",
        "number-of-patients",
        "number-of-hospitalizations",
        "ratio-of-rehospitalizations",
        "percentage",
        "percentage-of-sections",
        "duration-of-hospitalization-mediana",
        "duration-of-hospitalization-mode",
        "average-value-of-hospitalization",
        "average-value-of-hospitalization-points",
        "average-value-of-drg",
        "average-value-of-drg-points",
    ];
}

/// Stage 3b output: one row per (table, branch, year, age group)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct HospitalizationByAgeRecord {
    pub year: Cell,
    pub branch: Cell,
    pub name: Cell,
    pub age_group_name: Cell,
    pub number_of_hospitalizations: Cell,
    pub percentage: Cell,
    pub duration_of_hospitalization_mediana: Cell,
}

impl Row for HospitalizationByAgeRecord {
    const COLUMNS: &'static [&'static str] = &[
        "year",
        "branch",
        "name",
        "age-group-name",
        "number-of-hospitalizations",
        "percentage",
        "duration-of-hospitalization-mediana",
    ];
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Serialized field names must match the declared header
    fn header_of<R: Row + Default>() -> Vec<String> {
        let value = serde_json::to_value(R::default()).unwrap();
        value.as_object().unwrap().keys().cloned().collect()
    }

    fn assert_columns_match<R: Row + Default>() {
        let mut serialized = header_of::<R>();
        let mut declared: Vec<String> = R::COLUMNS.iter().map(|s| s.to_string()).collect();
        assert_eq!(serialized.len(), declared.len());
        serialized.sort();
        declared.sort();
        assert_eq!(serialized, declared);
    }

    #[test]
    fn general_data_columns_match_fields() {
        assert_eq!(GeneralDataRecord::COLUMNS.len(), 14);
        assert_columns_match::<GeneralDataRecord>();
    }

    #[test]
    fn hospitalization_columns_match_fields() {
        assert_eq!(HospitalizationByAgeRecord::COLUMNS.len(), 7);
        assert_columns_match::<HospitalizationByAgeRecord>();
    }

    /// Each cell holds its own column name, so the data row must equal the header
    fn assert_field_order<R: Row + serde::de::DeserializeOwned>() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("order.csv");
        let item: serde_json::Map<String, Value> = R::COLUMNS
            .iter()
            .map(|c| (c.to_string(), json!(c)))
            .collect();
        let rec: R = serde_json::from_value(Value::Object(item)).unwrap();
        nfzstat_core::manifest::write(&path, &[rec], nfzstat_core::WriteMode::Overwrite).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.trim_start_matches('\u{feff}').lines();
        let header = lines.next().unwrap();
        assert_eq!(lines.next(), Some(header));
    }

    #[test]
    fn serialized_order_matches_header() {
        assert_field_order::<GeneralDataRecord>();
        assert_field_order::<HospitalizationByAgeRecord>();
    }

    #[test]
    fn clean_name_strips_marker_and_whitespace() {
        assert_eq!(clean_benefit_name("  Hospitalizacja* "), "Hospitalizacja");
        assert_eq!(clean_benefit_name("*A*B*"), "AB");
        assert_eq!(clean_benefit_name("   "), "");
    }

    #[test]
    fn cell_from_scalars() {
        assert_eq!(Cell::from_value(&json!("x")).as_str(), "x");
        assert_eq!(Cell::from_value(&json!(2019)).as_str(), "2019");
        assert_eq!(Cell::from_value(&json!(12.5)).as_str(), "12.5");
        assert_eq!(Cell::from_value(&json!(true)).as_str(), "true");
        assert_eq!(Cell::from_value(&json!(null)).as_str(), "");
    }

    #[test]
    fn record_from_api_item() {
        let item = json!({
            "year": 2019,
            "branch": "01 - dolnośląski",
            "name": "A01",
            "age-group-name": "0-1",
            "number-of-hospitalizations": 12,
            "percentage": 0.25,
            "duration-of-hospitalization-mediana": null,
            "unrelated": {"nested": true}
        });
        let rec: HospitalizationByAgeRecord = serde_json::from_value(item).unwrap();
        assert_eq!(rec.branch.as_str(), "01 - dolnośląski");
        assert_eq!(rec.age_group_name.as_str(), "0-1");
        assert_eq!(rec.percentage.as_str(), "0.25");
        assert_eq!(rec.duration_of_hospitalization_mediana.as_str(), "");
    }

    #[test]
    fn missing_keys_are_empty() {
        let rec: GeneralDataRecord = serde_json::from_value(json!({"year": 2020})).unwrap();
        assert_eq!(rec.year.as_str(), "2020");
        assert_eq!(rec.average_value_of_drg_points.as_str(), "");
    }

    #[test]
    fn non_object_item_rejected() {
        assert!(serde_json::from_value::<GeneralDataRecord>(json!("A01")).is_err());
    }
}
