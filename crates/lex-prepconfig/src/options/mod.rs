//! Typed per-column option sets.
//!
//! Each data type has its own options struct with closed enums for every
//! choice, so an unknown option name or value is rejected where the
//! configuration is assembled instead of deep inside rule evaluation.
//!
//! Rule evaluation itself only needs a read-only view ("is feature X set?"),
//! expressed by the [`FeatureSet`] trait. It is implemented by the typed
//! structs, by the [`ColumnOptions`] union and by the dynamic [`FeatureMap`]
//! used at API boundaries and in tests.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::Result;
use crate::types::ColumnType;

/// Declares a closed set of option values with their wire names.
macro_rules! option_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($(#[$vmeta:meta])* $variant:ident => $value:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $($(#[$vmeta])* #[serde(rename = $value)] $variant,)+
        }

        impl $name {
            /// Every value, in display order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Wire name of the value.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $value,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl From<$name> for $crate::options::FeatureValue {
            fn from(value: $name) -> Self {
                $crate::options::FeatureValue::Choice(value.as_str().to_string())
            }
        }
    };
}

mod boolean;
mod categorical;
mod datetime;
mod identifier;
mod mixed;
mod numeric;
mod text;

pub use boolean::{BooleanEncoding, BooleanMissing, BooleanOptions};
pub use categorical::{CategoricalEncoding, CategoricalMissing, CategoricalOptions, MergeRare, TopN};
pub use datetime::{DatetimeMissing, DatetimeOptions, DatetimePart, TimeSince, TimeUnit};
pub use identifier::IdentifierOptions;
pub use mixed::{CoerceErrors, ConvertTo, MixedMissing, MixedOptions};
pub use numeric::{Binning, NumericMissing, NumericOptions, OutlierHandling, Scaling};
pub use text::{TextMissing, TextOptions, Vectorization};

/// A configured value for one feature.
///
/// Serialized without a tag, so the JSON shapes are plain scalars, lists or
/// small objects such as `{"threshold": 0.05}` or `{"bins": 10}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Flag(bool),
    Number(f64),
    Choice(String),
    List(Vec<String>),
    Threshold { threshold: f64 },
    Bins { bins: u32 },
    TopN { n: u32 },
    Unit { unit: String },
}

impl FeatureValue {
    pub fn choice(value: impl Into<String>) -> Self {
        Self::Choice(value.into())
    }

    pub fn list<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::List(values.into_iter().map(Into::into).collect())
    }

    /// Whether this value switches its feature on.
    ///
    /// `false`, `""`, `"none"` and `[]` mean "not set". Numbers are settings
    /// (decimal places, counts), so any number but NaN is set.
    pub fn is_active(&self) -> bool {
        match self {
            Self::Flag(flag) => *flag,
            Self::Number(n) => !n.is_nan(),
            Self::Choice(choice) => !choice.is_empty() && choice != "none",
            Self::List(items) => !items.is_empty(),
            Self::Threshold { .. } | Self::Bins { .. } | Self::TopN { .. } | Self::Unit { .. } => {
                true
            }
        }
    }

    /// The value as a choice string, if it is one.
    pub fn as_choice(&self) -> Option<&str> {
        match self {
            Self::Choice(choice) => Some(choice),
            _ => None,
        }
    }
}

impl From<bool> for FeatureValue {
    fn from(flag: bool) -> Self {
        Self::Flag(flag)
    }
}

impl From<&str> for FeatureValue {
    fn from(choice: &str) -> Self {
        Self::Choice(choice.to_string())
    }
}

impl From<f64> for FeatureValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

/// Read-only view of a column configuration used by rule evaluation.
pub trait FeatureSet {
    /// The configured value of `feature`, or `None` when it is not set.
    fn feature(&self, feature: &str) -> Option<FeatureValue>;

    /// Whether `feature` is present and truthy.
    fn is_active(&self, feature: &str) -> bool {
        self.feature(feature).is_some_and(|v| v.is_active())
    }
}

impl<T: FeatureSet + ?Sized> FeatureSet for &T {
    fn feature(&self, feature: &str) -> Option<FeatureValue> {
        (**self).feature(feature)
    }
}

/// Untyped feature name to value mapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureMap(BTreeMap<String, FeatureValue>);

impl FeatureMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, feature: impl Into<String>, value: impl Into<FeatureValue>) -> Self {
        self.insert(feature, value);
        self
    }

    pub fn insert(&mut self, feature: impl Into<String>, value: impl Into<FeatureValue>) {
        self.0.insert(feature.into(), value.into());
    }

    pub fn remove(&mut self, feature: &str) -> Option<FeatureValue> {
        self.0.remove(feature)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FeatureValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl FeatureSet for FeatureMap {
    fn feature(&self, feature: &str) -> Option<FeatureValue> {
        self.0.get(feature).cloned()
    }
}

impl FromIterator<(String, FeatureValue)> for FeatureMap {
    fn from_iter<I: IntoIterator<Item = (String, FeatureValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Options for one column (or one data type in simple mode), tagged by type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "options", rename_all = "snake_case")]
pub enum ColumnOptions {
    Numeric(NumericOptions),
    Categorical(CategoricalOptions),
    Text(TextOptions),
    Datetime(DatetimeOptions),
    Boolean(BooleanOptions),
    Identifier(IdentifierOptions),
    Mixed(MixedOptions),
}

impl ColumnOptions {
    /// Empty options (nothing configured) for a data type.
    pub fn empty(column_type: ColumnType) -> Self {
        match column_type {
            ColumnType::Numeric => Self::Numeric(NumericOptions::default()),
            ColumnType::Categorical => Self::Categorical(CategoricalOptions::default()),
            ColumnType::Text => Self::Text(TextOptions::default()),
            ColumnType::Datetime => Self::Datetime(DatetimeOptions::default()),
            ColumnType::Boolean => Self::Boolean(BooleanOptions::default()),
            ColumnType::Identifier => Self::Identifier(IdentifierOptions::default()),
            ColumnType::Mixed => Self::Mixed(MixedOptions::default()),
        }
    }

    pub fn column_type(&self) -> ColumnType {
        match self {
            Self::Numeric(_) => ColumnType::Numeric,
            Self::Categorical(_) => ColumnType::Categorical,
            Self::Text(_) => ColumnType::Text,
            Self::Datetime(_) => ColumnType::Datetime,
            Self::Boolean(_) => ColumnType::Boolean,
            Self::Identifier(_) => ColumnType::Identifier,
            Self::Mixed(_) => ColumnType::Mixed,
        }
    }

    /// Build typed options from an untyped feature map.
    ///
    /// Fails on unknown features or values outside the closed choice sets.
    pub fn from_feature_map(column_type: ColumnType, map: &FeatureMap) -> Result<Self> {
        let value = serde_json::to_value(map)?;
        let options = match column_type {
            ColumnType::Numeric => Self::Numeric(serde_json::from_value(value)?),
            ColumnType::Categorical => Self::Categorical(serde_json::from_value(value)?),
            ColumnType::Text => Self::Text(serde_json::from_value(value)?),
            ColumnType::Datetime => Self::Datetime(serde_json::from_value(value)?),
            ColumnType::Boolean => Self::Boolean(serde_json::from_value(value)?),
            ColumnType::Identifier => Self::Identifier(serde_json::from_value(value)?),
            ColumnType::Mixed => Self::Mixed(serde_json::from_value(value)?),
        };
        Ok(options)
    }

    /// Flatten into an untyped feature map (unset features omitted).
    pub fn to_feature_map(&self) -> Result<FeatureMap> {
        let value = match self {
            Self::Numeric(o) => serde_json::to_value(o)?,
            Self::Categorical(o) => serde_json::to_value(o)?,
            Self::Text(o) => serde_json::to_value(o)?,
            Self::Datetime(o) => serde_json::to_value(o)?,
            Self::Boolean(o) => serde_json::to_value(o)?,
            Self::Identifier(o) => serde_json::to_value(o)?,
            Self::Mixed(o) => serde_json::to_value(o)?,
        };
        Ok(serde_json::from_value(value)?)
    }

    fn as_feature_set(&self) -> &dyn FeatureSet {
        match self {
            Self::Numeric(o) => o,
            Self::Categorical(o) => o,
            Self::Text(o) => o,
            Self::Datetime(o) => o,
            Self::Boolean(o) => o,
            Self::Identifier(o) => o,
            Self::Mixed(o) => o,
        }
    }
}

impl FeatureSet for ColumnOptions {
    fn feature(&self, feature: &str) -> Option<FeatureValue> {
        self.as_feature_set().feature(feature)
    }
}

pub(crate) fn is_false(flag: &bool) -> bool {
    !*flag
}

/// `Some(Flag(true))` for a set flag, `None` otherwise.
pub(crate) fn flag(value: bool) -> Option<FeatureValue> {
    value.then_some(FeatureValue::Flag(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_active_rules() {
        assert!(FeatureValue::Flag(true).is_active());
        assert!(!FeatureValue::Flag(false).is_active());
        assert!(!FeatureValue::choice("none").is_active());
        assert!(!FeatureValue::choice("").is_active());
        assert!(FeatureValue::choice("one_hot").is_active());
        assert!(!FeatureValue::List(vec![]).is_active());
        assert!(FeatureValue::list(["year"]).is_active());
        assert!(FeatureValue::Number(0.0).is_active());
        assert!(!FeatureValue::Number(f64::NAN).is_active());
        assert!(FeatureValue::Bins { bins: 4 }.is_active());
    }

    #[test]
    fn test_feature_value_json_shapes() {
        let cases = [
            (r#"true"#, FeatureValue::Flag(true)),
            (r#""drop""#, FeatureValue::choice("drop")),
            (r#"["year","month"]"#, FeatureValue::list(["year", "month"])),
            (r#"{"threshold":0.05}"#, FeatureValue::Threshold { threshold: 0.05 }),
            (r#"{"bins":10}"#, FeatureValue::Bins { bins: 10 }),
            (r#"{"n":20}"#, FeatureValue::TopN { n: 20 }),
            (r#"{"unit":"days"}"#, FeatureValue::Unit { unit: "days".to_string() }),
        ];
        for (json, expected) in cases {
            let parsed: FeatureValue = serde_json::from_str(json).unwrap();
            assert_eq!(parsed, expected, "parsing {json}");
        }
        let number: FeatureValue = serde_json::from_str("2").unwrap();
        assert_eq!(number, FeatureValue::Number(2.0));
    }

    #[test]
    fn test_feature_map_is_a_feature_set() {
        let map = FeatureMap::new()
            .with("missing", "drop")
            .with("encoding", "none")
            .with("lowercase", true);
        assert!(map.is_active("missing"));
        assert!(!map.is_active("encoding"));
        assert!(map.is_active("lowercase"));
        assert!(!map.is_active("merge_rare"));
    }

    #[test]
    fn test_column_options_from_feature_map() {
        let map = FeatureMap::new()
            .with("missing", "mode")
            .with("merge_rare", FeatureValue::Threshold { threshold: 0.01 })
            .with("encoding", "one_hot");
        let options = ColumnOptions::from_feature_map(ColumnType::Categorical, &map).unwrap();
        assert_eq!(options.column_type(), ColumnType::Categorical);
        assert!(options.is_active("merge_rare"));
        assert_eq!(
            options.feature("encoding"),
            Some(FeatureValue::choice("one_hot"))
        );
        assert_eq!(options.to_feature_map().unwrap(), map);
    }

    #[test]
    fn test_column_options_rejects_unknown_values() {
        let bad_value = FeatureMap::new().with("encoding", "embedding");
        assert!(ColumnOptions::from_feature_map(ColumnType::Categorical, &bad_value).is_err());

        let bad_feature = FeatureMap::new().with("vectorization", "tfidf");
        assert!(ColumnOptions::from_feature_map(ColumnType::Numeric, &bad_feature).is_err());
    }

    #[test]
    fn test_column_options_tagged_json() {
        let options = ColumnOptions::Boolean(BooleanOptions {
            encode: Some(BooleanEncoding::ZeroOne),
            ..Default::default()
        });
        let json = serde_json::to_value(&options).unwrap();
        assert_eq!(json["type"], "boolean");
        assert_eq!(json["options"]["encode"], "0_1");
    }
}
