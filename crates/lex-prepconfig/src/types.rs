use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// Detected semantic type of a column, used as the key of every per-type
/// table (rules, options, catalog) and of the `preprocessing` request section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Numeric,
    Categorical,
    Text,
    Datetime,
    Boolean,
    Identifier,
    Mixed,
}

impl ColumnType {
    /// All column types in request order.
    pub const ALL: [ColumnType; 7] = [
        ColumnType::Numeric,
        ColumnType::Categorical,
        ColumnType::Text,
        ColumnType::Datetime,
        ColumnType::Boolean,
        ColumnType::Identifier,
        ColumnType::Mixed,
    ];

    /// Key used in the `preprocessing` section of the request body.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Numeric => "numeric",
            Self::Categorical => "categorical",
            Self::Text => "text",
            Self::Datetime => "datetime",
            Self::Boolean => "boolean",
            Self::Identifier => "identifier",
            Self::Mixed => "mixed",
        }
    }

    /// Label the backend uses in `preprocessing_data_type`.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Numeric => "Numeric",
            Self::Categorical => "Categorical",
            Self::Text => "Text",
            Self::Datetime => "Datetime / Date",
            Self::Boolean => "Boolean",
            Self::Identifier => "ID / Unique Identifier",
            Self::Mixed => "Mixed / Unknown / Dirty Data",
        }
    }

    /// Parse a backend `preprocessing_data_type` label.
    ///
    /// Matching ignores surrounding whitespace and case.
    pub fn from_label(label: &str) -> Result<Self, ConfigError> {
        let trimmed = label.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.label().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ConfigError::UnknownDataType(label.to_string()))
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Parses a type key (`"numeric"`, `"datetime"`, ...), falling back to the
/// backend label.
impl FromStr for ColumnType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.key().eq_ignore_ascii_case(trimmed))
            .map_or_else(|| Self::from_label(trimmed), Ok)
    }
}

/// Summary statistics the backend computes for a column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnStats {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique_count: Option<usize>,
    /// Fraction of missing values (0.0 - 1.0).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing_ratio: Option<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sample_values: Vec<serde_json::Value>,
}

/// A column as described by the backend. Read-only to the editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    pub preprocessing_data_type: String,
    #[serde(default)]
    pub stats: ColumnStats,
}

impl ColumnDescriptor {
    /// Create a descriptor with empty statistics.
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            preprocessing_data_type: column_type.label().to_string(),
            stats: ColumnStats::default(),
        }
    }

    /// Resolve the detected data type.
    pub fn column_type(&self) -> Result<ColumnType, ConfigError> {
        ColumnType::from_label(&self.preprocessing_data_type)
    }

    /// Attach statistics.
    pub fn with_stats(mut self, stats: ColumnStats) -> Self {
        self.stats = stats;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_label_all_backend_labels() {
        for column_type in ColumnType::ALL {
            assert_eq!(ColumnType::from_label(column_type.label()).unwrap(), column_type);
        }
    }

    #[test]
    fn test_from_label_is_lenient() {
        assert_eq!(
            ColumnType::from_label("  datetime / date ").unwrap(),
            ColumnType::Datetime
        );
        assert!(matches!(
            ColumnType::from_label("Geo"),
            Err(ConfigError::UnknownDataType(_))
        ));
    }

    #[test]
    fn test_from_str_accepts_keys_and_labels() {
        assert_eq!("mixed".parse::<ColumnType>().unwrap(), ColumnType::Mixed);
        assert_eq!(
            "ID / Unique Identifier".parse::<ColumnType>().unwrap(),
            ColumnType::Identifier
        );
    }

    #[test]
    fn test_column_type_serializes_as_key() {
        let json = serde_json::to_string(&ColumnType::Datetime).unwrap();
        assert_eq!(json, "\"datetime\"");
    }

    #[test]
    fn test_descriptor_from_backend_json() {
        let json = r#"{
            "name": "signup_date",
            "preprocessing_data_type": "Datetime / Date",
            "stats": {"unique_count": 120, "missing_ratio": 0.05, "sample_values": ["2024-01-01"]}
        }"#;
        let descriptor: ColumnDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(descriptor.column_type().unwrap(), ColumnType::Datetime);
        assert_eq!(descriptor.stats.unique_count, Some(120));
        assert_eq!(descriptor.stats.min, None);
    }

    #[test]
    fn test_descriptor_without_stats() {
        let json = r#"{"name": "id", "preprocessing_data_type": "ID / Unique Identifier"}"#;
        let descriptor: ColumnDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(descriptor.stats, ColumnStats::default());
    }
}
