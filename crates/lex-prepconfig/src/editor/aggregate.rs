//! The configuration sent to the backend.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;
use crate::options::{
    BooleanOptions, CategoricalOptions, ColumnOptions, DatetimeOptions, IdentifierOptions,
    MixedOptions, NumericOptions, TextOptions,
};
use crate::types::ColumnType;

/// Whether options apply to every column of a type or to single columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigMode {
    /// One options set per data type (`global`).
    #[default]
    Simple,
    /// One options set per column (`per_column`).
    Advanced,
}

impl fmt::Display for ConfigMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Simple => f.write_str("simple"),
            Self::Advanced => f.write_str("advanced"),
        }
    }
}

impl FromStr for ConfigMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "simple" => Ok(Self::Simple),
            "advanced" => Ok(Self::Advanced),
            other => Err(ConfigError::InvalidSettings(format!(
                "unknown mode '{other}' (expected simple or advanced)"
            ))),
        }
    }
}

/// Options of one data type: either shared (`global`) or per column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeSection<T> {
    #[serde(default)]
    pub global: Option<T>,
    #[serde(default)]
    pub per_column: BTreeMap<String, T>,
}

impl<T> Default for TypeSection<T> {
    fn default() -> Self {
        Self {
            global: None,
            per_column: BTreeMap::new(),
        }
    }
}

impl<T> TypeSection<T> {
    pub fn is_empty(&self) -> bool {
        self.global.is_none() && self.per_column.is_empty()
    }
}

/// Where a configured options set applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SliceTarget {
    Global(ColumnType),
    Column { name: String, column_type: ColumnType },
}

impl fmt::Display for SliceTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global(column_type) => write!(f, "{column_type} (all columns)"),
            Self::Column { name, .. } => write!(f, "column '{name}'"),
        }
    }
}

/// One configured options set together with its target.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigSlice {
    pub target: SliceTarget,
    pub options: ColumnOptions,
}

/// Maps the typed sections to and from [`ColumnOptions`].
macro_rules! sections {
    ($($field:ident: $variant:ident($options:ty)),+ $(,)?) => {
        /// The `preprocessing` object: one section per data type.
        #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
        pub struct PreprocessingSections {
            $(
                #[serde(default)]
                pub $field: TypeSection<$options>,
            )+
        }

        impl PreprocessingSections {
            /// Replace the shared options of the data type `options` belongs to.
            pub fn set_global(&mut self, options: ColumnOptions) {
                match options {
                    $(ColumnOptions::$variant(o) => self.$field.global = Some(o),)+
                }
            }

            /// Replace the options of a single column.
            pub fn set_column(&mut self, column: impl Into<String>, options: ColumnOptions) {
                let column = column.into();
                match options {
                    $(ColumnOptions::$variant(o) => {
                        self.$field.per_column.insert(column, o);
                    })+
                }
            }

            pub fn global(&self, column_type: ColumnType) -> Option<ColumnOptions> {
                match column_type {
                    $(ColumnType::$variant => self.$field.global.clone().map(ColumnOptions::$variant),)+
                }
            }

            pub fn column(&self, column: &str, column_type: ColumnType) -> Option<ColumnOptions> {
                match column_type {
                    $(ColumnType::$variant => self
                        .$field
                        .per_column
                        .get(column)
                        .cloned()
                        .map(ColumnOptions::$variant),)+
                }
            }

            /// Whether any data type has shared options.
            pub fn has_globals(&self) -> bool {
                false $(|| self.$field.global.is_some())+
            }

            /// Whether any column has its own options.
            pub fn has_columns(&self) -> bool {
                false $(|| !self.$field.per_column.is_empty())+
            }

            /// Every configured options set, shared ones first, in type order.
            pub fn slices(&self) -> Vec<ConfigSlice> {
                let mut slices = Vec::new();
                $(
                    if let Some(o) = &self.$field.global {
                        slices.push(ConfigSlice {
                            target: SliceTarget::Global(ColumnType::$variant),
                            options: ColumnOptions::$variant(o.clone()),
                        });
                    }
                )+
                $(
                    for (name, o) in &self.$field.per_column {
                        slices.push(ConfigSlice {
                            target: SliceTarget::Column {
                                name: name.clone(),
                                column_type: ColumnType::$variant,
                            },
                            options: ColumnOptions::$variant(o.clone()),
                        });
                    }
                )+
                slices
            }
        }
    };
}

sections! {
    numeric: Numeric(NumericOptions),
    categorical: Categorical(CategoricalOptions),
    text: Text(TextOptions),
    datetime: Datetime(DatetimeOptions),
    boolean: Boolean(BooleanOptions),
    identifier: Identifier(IdentifierOptions),
    mixed: Mixed(MixedOptions),
}

impl PreprocessingSections {
    /// Rewrite every configured options set through `f`.
    pub fn map_options(&mut self, mut f: impl FnMut(ColumnOptions) -> ColumnOptions) {
        let slices = self.slices();
        *self = Self::default();
        for slice in slices {
            let options = f(slice.options);
            match slice.target {
                SliceTarget::Global(_) => self.set_global(options),
                SliceTarget::Column { name, .. } => self.set_column(name, options),
            }
        }
    }
}

/// Request body for a preprocessing job.
///
/// In simple mode only `global` entries are populated; in advanced mode only
/// `per_column` entries are.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreprocessingConfig {
    pub mode: ConfigMode,
    #[serde(default)]
    pub preprocessing: PreprocessingSections,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_filename: Option<String>,
}

impl PreprocessingConfig {
    pub fn new(mode: ConfigMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    /// Options that apply to a column under the current mode.
    ///
    /// A column without configured options gets an empty set.
    pub fn options_for_column(&self, column: &str, column_type: ColumnType) -> ColumnOptions {
        let configured = match self.mode {
            ConfigMode::Simple => self.preprocessing.global(column_type),
            ConfigMode::Advanced => self.preprocessing.column(column, column_type),
        };
        configured.unwrap_or_else(|| ColumnOptions::empty(column_type))
    }

    /// Whether only the sections matching the mode are populated.
    pub fn mode_invariant_holds(&self) -> bool {
        match self.mode {
            ConfigMode::Simple => !self.preprocessing.has_columns(),
            ConfigMode::Advanced => !self.preprocessing.has_globals(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{CategoricalEncoding, NumericMissing};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn numeric_median() -> ColumnOptions {
        ColumnOptions::Numeric(NumericOptions {
            missing: Some(NumericMissing::Median),
            ..Default::default()
        })
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("Advanced".parse::<ConfigMode>().unwrap(), ConfigMode::Advanced);
        assert!("expert".parse::<ConfigMode>().is_err());
        assert_eq!(ConfigMode::Simple.to_string(), "simple");
    }

    #[test]
    fn test_simple_config_json_shape() {
        let mut config = PreprocessingConfig::new(ConfigMode::Simple);
        config.preprocessing.set_global(numeric_median());

        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["mode"], "simple");
        assert_eq!(json["preprocessing"]["numeric"]["global"], json!({"missing": "median"}));
        assert_eq!(json["preprocessing"]["numeric"]["per_column"], json!({}));
        assert_eq!(json["preprocessing"]["text"]["global"], serde_json::Value::Null);
        assert!(json.get("output_filename").is_none());
    }

    #[test]
    fn test_advanced_config_round_trip() {
        let mut config = PreprocessingConfig::new(ConfigMode::Advanced);
        config.preprocessing.set_column(
            "city",
            ColumnOptions::Categorical(CategoricalOptions {
                encoding: Some(CategoricalEncoding::OneHot),
                ..Default::default()
            }),
        );
        config.output_filename = Some("out.csv".to_string());

        let json = serde_json::to_string(&config).unwrap();
        let parsed: PreprocessingConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
        assert!(parsed.mode_invariant_holds());
    }

    #[test]
    fn test_options_for_column_by_mode() {
        let mut config = PreprocessingConfig::new(ConfigMode::Simple);
        config.preprocessing.set_global(numeric_median());
        assert_eq!(config.options_for_column("age", ColumnType::Numeric), numeric_median());
        assert_eq!(
            config.options_for_column("name", ColumnType::Text),
            ColumnOptions::empty(ColumnType::Text)
        );

        config.mode = ConfigMode::Advanced;
        assert_eq!(
            config.options_for_column("age", ColumnType::Numeric),
            ColumnOptions::empty(ColumnType::Numeric)
        );
        assert!(!config.mode_invariant_holds());
    }

    #[test]
    fn test_slice_labels() {
        let mut sections = PreprocessingSections::default();
        sections.set_global(numeric_median());
        sections.set_column("age", numeric_median());

        let labels: Vec<String> = sections.slices().iter().map(|s| s.target.to_string()).collect();
        assert_eq!(labels, vec!["numeric (all columns)", "column 'age'"]);
    }

    #[test]
    fn test_map_options_keeps_targets() {
        let mut sections = PreprocessingSections::default();
        sections.set_column("a", numeric_median());
        sections.set_column("b", ColumnOptions::empty(ColumnType::Numeric));

        sections.map_options(|_| ColumnOptions::empty(ColumnType::Numeric));
        assert_eq!(sections.numeric.per_column.len(), 2);
        assert!(!sections.has_globals());
    }

    #[test]
    fn test_backend_body_without_sections() {
        let config: PreprocessingConfig = serde_json::from_str(r#"{"mode": "advanced"}"#).unwrap();
        assert_eq!(config.mode, ConfigMode::Advanced);
        assert!(config.preprocessing.slices().is_empty());
    }
}
