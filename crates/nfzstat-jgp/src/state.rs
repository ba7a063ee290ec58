//! Stage and table-type identifiers for the JGP statistics pipeline

use std::fmt;

/// The four extraction stages, in pipeline order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Benefit names (no input manifest)
    Benefits,
    /// Table ids per benefit × year × catalog
    TableIndex,
    /// Patient and hospitalization statistics per table
    GeneralData,
    /// Age-bucketed statistics per table
    HospitalizationByAge,
}

impl Stage {
    /// Parse CLI/config string into enum
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "benefits" => Some(Self::Benefits),
            "index-of-tables" | "table-index" => Some(Self::TableIndex),
            "general-data" | "basic-data" => Some(Self::GeneralData),
            "hospitalization-by-age" => Some(Self::HospitalizationByAge),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Benefits => "benefits",
            Self::TableIndex => "index-of-tables",
            Self::GeneralData => "general-data",
            Self::HospitalizationByAge => "hospitalization-by-age",
        }
    }

    /// Stage whose output this stage reads
    pub fn input(self) -> Option<Self> {
        match self {
            Self::Benefits => None,
            Self::TableIndex => Some(Self::Benefits),
            Self::GeneralData | Self::HospitalizationByAge => Some(Self::TableIndex),
        }
    }

    /// All stages in run order
    pub fn all() -> &'static [Stage] {
        &[
            Self::Benefits,
            Self::TableIndex,
            Self::GeneralData,
            Self::HospitalizationByAge,
        ]
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Table kinds routed to a detail stage (the `type` discriminator)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableType {
    GeneralData,
    HospitalizationByAge,
}

impl TableType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::GeneralData => "general-data",
            Self::HospitalizationByAge => "hospitalization-by-age",
        }
    }

    /// Every type the table index keeps; anything else is dropped there
    pub fn wanted() -> [&'static str; 2] {
        [
            Self::GeneralData.as_str(),
            Self::HospitalizationByAge.as_str(),
        ]
    }
}

impl fmt::Display for TableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_name_roundtrip() {
        for &stage in Stage::all() {
            assert_eq!(Stage::from_name(stage.name()), Some(stage));
        }
    }

    #[test]
    fn from_name_aliases() {
        assert_eq!(Stage::from_name("Table-Index"), Some(Stage::TableIndex));
        assert_eq!(Stage::from_name("basic-data"), Some(Stage::GeneralData));
        assert_eq!(Stage::from_name("demography"), None);
    }

    #[test]
    fn inputs_form_a_chain() {
        assert_eq!(Stage::Benefits.input(), None);
        assert_eq!(Stage::TableIndex.input(), Some(Stage::Benefits));
        assert_eq!(Stage::GeneralData.input(), Some(Stage::TableIndex));
        assert_eq!(Stage::HospitalizationByAge.input(), Some(Stage::TableIndex));
    }

    #[test]
    fn wanted_types_match_discriminators() {
        assert_eq!(
            TableType::wanted(),
            ["general-data", "hospitalization-by-age"]
        );
    }
}
