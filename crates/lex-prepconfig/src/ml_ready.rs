//! ML-Ready gate.
//!
//! With the ML-Ready flag on, every output column has to be numeric. The gate
//! has three parts:
//!
//! - [`apply_ml_ready`] forces the feature that turns a column numeric when the
//!   flag is switched on (encoding, vectorization, `0_1`, date part
//!   extraction, numeric conversion, dropping identifiers);
//! - [`is_option_allowed`] and [`is_locked`] narrow what a panel offers while
//!   the flag stays on;
//! - [`validate_ml_ready`] checks every column at submission time.
//!
//! Violations are advisory. They block submission and never change the
//! configuration.

use serde::Serialize;
use tracing::{debug, warn};

use crate::editor::PreprocessingConfig;
use crate::options::{
    BooleanEncoding, BooleanMissing, CategoricalEncoding, ColumnOptions, ConvertTo, DatetimePart,
    FeatureValue, Vectorization,
};
use crate::types::{ColumnDescriptor, ColumnType};

/// Panel state, derived only from the ML-Ready flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelMode {
    /// Every option is available.
    #[default]
    Default,
    /// Options narrowed, some fields forced and read-only.
    MlReadyConstrained,
}

impl PanelMode {
    pub fn from_flag(ml_ready: bool) -> Self {
        if ml_ready {
            Self::MlReadyConstrained
        } else {
            Self::Default
        }
    }

    pub fn is_constrained(&self) -> bool {
        matches!(self, Self::MlReadyConstrained)
    }
}

/// Choices that would leave a column non-numeric.
const FILTERED_OPTIONS: &[(ColumnType, &str, &[&str])] = &[
    (ColumnType::Categorical, "encoding", &["none"]),
    (ColumnType::Text, "vectorization", &["none"]),
    (ColumnType::Boolean, "encode", &["keep", "yes_no"]),
    (ColumnType::Boolean, "missing", &["fill_true", "fill_false"]),
    (ColumnType::Mixed, "convert_to", &["keep_as_string", "datetime"]),
];

/// Fields shown checked and read-only while the flag is on.
const LOCKED_FIELDS: &[(ColumnType, &str)] = &[
    (ColumnType::Text, "drop_original"),
    (ColumnType::Datetime, "drop_original"),
    (ColumnType::Boolean, "encode"),
    (ColumnType::Identifier, "drop"),
    (ColumnType::Identifier, "hash"),
    (ColumnType::Identifier, "check_duplicates"),
    (ColumnType::Mixed, "convert_to"),
];

/// Whether `value` may be offered for `feature` while ML-Ready is on.
pub fn is_option_allowed(column_type: ColumnType, feature: &str, value: &str) -> bool {
    !FILTERED_OPTIONS
        .iter()
        .any(|(t, f, values)| *t == column_type && *f == feature && values.contains(&value))
}

/// Whether the field is forced and read-only while ML-Ready is on.
pub fn is_locked(column_type: ColumnType, feature: &str) -> bool {
    LOCKED_FIELDS
        .iter()
        .any(|(t, f)| *t == column_type && *f == feature)
}

/// The value a locked field is held at.
pub fn forced_value(column_type: ColumnType, feature: &str) -> Option<FeatureValue> {
    match (column_type, feature) {
        (ColumnType::Text | ColumnType::Datetime, "drop_original")
        | (ColumnType::Identifier, "drop") => Some(FeatureValue::Flag(true)),
        (ColumnType::Identifier, "hash" | "check_duplicates") => Some(FeatureValue::Flag(false)),
        (ColumnType::Boolean, "encode") => Some(BooleanEncoding::ZeroOne.into()),
        (ColumnType::Mixed, "convert_to") => Some(ConvertTo::Numeric.into()),
        _ => None,
    }
}

/// Force the numeric-producing features of one options set.
///
/// Allowed choices the user already made are kept; only empty or
/// non-numeric-preserving values are replaced.
pub fn apply_ml_ready(options: ColumnOptions) -> ColumnOptions {
    match options {
        ColumnOptions::Numeric(o) => ColumnOptions::Numeric(o),
        ColumnOptions::Categorical(mut o) => {
            if matches!(o.encoding, None | Some(CategoricalEncoding::None)) {
                o.encoding = Some(CategoricalEncoding::OneHot);
            }
            ColumnOptions::Categorical(o)
        }
        ColumnOptions::Text(mut o) => {
            if matches!(o.vectorization, None | Some(Vectorization::None)) {
                o.vectorization = Some(Vectorization::Tfidf);
            }
            o.drop_original = true;
            ColumnOptions::Text(o)
        }
        ColumnOptions::Datetime(mut o) => {
            if o.extract.is_empty() {
                o.extract = vec![DatetimePart::Year, DatetimePart::Month, DatetimePart::Day];
            }
            o.drop_original = true;
            ColumnOptions::Datetime(o)
        }
        ColumnOptions::Boolean(mut o) => {
            o.encode = Some(BooleanEncoding::ZeroOne);
            if matches!(
                o.missing,
                Some(BooleanMissing::FillTrue | BooleanMissing::FillFalse)
            ) {
                o.missing = Some(BooleanMissing::Mode);
            }
            ColumnOptions::Boolean(o)
        }
        ColumnOptions::Identifier(mut o) => {
            o.drop = true;
            o.hash = false;
            o.check_duplicates = false;
            ColumnOptions::Identifier(o)
        }
        ColumnOptions::Mixed(mut o) => {
            o.convert_to = Some(ConvertTo::Numeric);
            ColumnOptions::Mixed(o)
        }
    }
}

/// A column that would not come out numeric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MlReadyViolation {
    pub column: String,
    pub column_type: ColumnType,
    pub message: String,
}

/// What a column of this type is missing, if anything.
fn shortfall(options: &ColumnOptions) -> Option<&'static str> {
    match options {
        ColumnOptions::Categorical(o) => {
            matches!(o.encoding, None | Some(CategoricalEncoding::None))
                .then_some("select an encoding method")
        }
        ColumnOptions::Text(o) => matches!(o.vectorization, None | Some(Vectorization::None))
            .then_some("select a vectorization method"),
        ColumnOptions::Boolean(o) => {
            (o.encode != Some(BooleanEncoding::ZeroOne)).then_some("encode values as 0/1")
        }
        ColumnOptions::Datetime(o) => o
            .extract
            .is_empty()
            .then_some("extract at least one date component"),
        ColumnOptions::Mixed(o) => (!o.drop && o.convert_to != Some(ConvertTo::Numeric))
            .then_some("drop the column or convert it to numeric"),
        ColumnOptions::Numeric(_) | ColumnOptions::Identifier(_) => None,
    }
}

/// Check that every column comes out numeric under `config`.
///
/// Options are resolved per column for the configuration's mode; a column with
/// nothing configured is checked against empty options. Columns whose data type
/// label is unknown are skipped.
pub fn validate_ml_ready(
    columns: &[ColumnDescriptor],
    config: &PreprocessingConfig,
) -> Vec<MlReadyViolation> {
    let mut violations = Vec::new();

    for column in columns {
        let column_type = match column.column_type() {
            Ok(t) => t,
            Err(e) => {
                warn!(column = %column.name, "Skipping ML-ready check: {}", e);
                continue;
            }
        };

        let options = config.options_for_column(&column.name, column_type);
        if let Some(reason) = shortfall(&options) {
            violations.push(MlReadyViolation {
                column: column.name.clone(),
                column_type,
                message: format!(
                    "Column '{}' ({column_type}) is not ML-ready: {reason}.",
                    column.name
                ),
            });
        }
    }

    debug!(
        columns = columns.len(),
        violations = violations.len(),
        "ML-ready validation finished"
    );
    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::ConfigMode;
    use crate::options::{
        BooleanOptions, CategoricalOptions, DatetimeOptions, FeatureSet, IdentifierOptions,
        MixedOptions, TextOptions,
    };
    use crate::rules::{rules_for, validate_configuration};

    fn advanced_with(column: &str, options: ColumnOptions) -> PreprocessingConfig {
        let mut config = PreprocessingConfig::new(ConfigMode::Advanced);
        config.preprocessing.set_column(column, options);
        config
    }

    fn check(column: &str, options: ColumnOptions) -> Vec<MlReadyViolation> {
        let column_type = options.column_type();
        let columns = vec![ColumnDescriptor::new(column, column_type)];
        validate_ml_ready(&columns, &advanced_with(column, options))
    }

    // ==================== validate_ml_ready tests ====================

    #[test]
    fn test_text_without_vectorization_names_column() {
        let violations = check(
            "review",
            ColumnOptions::Text(TextOptions {
                vectorization: Some(Vectorization::None),
                ..Default::default()
            }),
        );
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].column, "review");
        assert!(violations[0].message.contains("'review'"));
    }

    #[test]
    fn test_boolean_zero_one_passes() {
        let violations = check(
            "active",
            ColumnOptions::Boolean(BooleanOptions {
                encode: Some(BooleanEncoding::ZeroOne),
                ..Default::default()
            }),
        );
        assert!(violations.is_empty());

        let keep = check(
            "active",
            ColumnOptions::Boolean(BooleanOptions {
                encode: Some(BooleanEncoding::Keep),
                ..Default::default()
            }),
        );
        assert_eq!(keep.len(), 1);
    }

    #[test]
    fn test_datetime_extract_list() {
        let empty = check("signup", ColumnOptions::Datetime(DatetimeOptions::default()));
        assert_eq!(empty.len(), 1);

        let year = check(
            "signup",
            ColumnOptions::Datetime(DatetimeOptions {
                extract: vec![DatetimePart::Year],
                ..Default::default()
            }),
        );
        assert!(year.is_empty());
    }

    #[test]
    fn test_mixed_drop_or_numeric() {
        let dropped = check(
            "notes",
            ColumnOptions::Mixed(MixedOptions {
                drop: true,
                convert_to: Some(ConvertTo::KeepAsString),
                ..Default::default()
            }),
        );
        assert!(dropped.is_empty());

        let kept = check(
            "notes",
            ColumnOptions::Mixed(MixedOptions {
                drop: false,
                convert_to: Some(ConvertTo::KeepAsString),
                ..Default::default()
            }),
        );
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn test_categorical_encoding() {
        assert_eq!(
            check("city", ColumnOptions::Categorical(CategoricalOptions::default())).len(),
            1
        );
        for encoding in CategoricalEncoding::ALL
            .iter()
            .filter(|e| **e != CategoricalEncoding::None)
        {
            let violations = check(
                "city",
                ColumnOptions::Categorical(CategoricalOptions {
                    encoding: Some(*encoding),
                    ..Default::default()
                }),
            );
            assert!(violations.is_empty(), "{encoding} should be ML-ready");
        }
    }

    #[test]
    fn test_numeric_and_identifier_not_checked() {
        assert!(check("age", ColumnOptions::empty(ColumnType::Numeric)).is_empty());
        assert!(check("id", ColumnOptions::empty(ColumnType::Identifier)).is_empty());
    }

    #[test]
    fn test_simple_mode_uses_type_global() {
        let mut config = PreprocessingConfig::new(ConfigMode::Simple);
        config.preprocessing.set_global(ColumnOptions::Text(TextOptions {
            vectorization: Some(Vectorization::Count),
            ..Default::default()
        }));
        let columns = vec![
            ColumnDescriptor::new("title", ColumnType::Text),
            ColumnDescriptor::new("body", ColumnType::Text),
            ColumnDescriptor::new("kind", ColumnType::Categorical),
        ];
        let violations = validate_ml_ready(&columns, &config);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].column, "kind");
    }

    #[test]
    fn test_unknown_data_type_is_skipped() {
        let column = ColumnDescriptor {
            name: "geo".to_string(),
            preprocessing_data_type: "Geospatial".to_string(),
            stats: Default::default(),
        };
        let config = PreprocessingConfig::new(ConfigMode::Simple);
        assert!(validate_ml_ready(&[column], &config).is_empty());
    }

    // ==================== apply_ml_ready tests ====================

    #[test]
    fn test_gate_output_is_valid_and_ml_ready() {
        for column_type in ColumnType::ALL {
            let gated = apply_ml_ready(ColumnOptions::empty(column_type));
            let validation = validate_configuration(column_type, &gated);
            assert!(validation.valid, "{column_type}: {:?}", validation.errors);
            assert_eq!(shortfall(&gated), None, "{column_type} still not ML-ready");
        }
    }

    #[test]
    fn test_gate_keeps_allowed_choice() {
        let gated = apply_ml_ready(ColumnOptions::Categorical(CategoricalOptions {
            encoding: Some(CategoricalEncoding::Frequency),
            ..Default::default()
        }));
        assert_eq!(gated.feature("encoding"), Some(FeatureValue::choice("frequency")));
    }

    #[test]
    fn test_gate_replaces_filtered_choices() {
        let gated = apply_ml_ready(ColumnOptions::Boolean(BooleanOptions {
            missing: Some(BooleanMissing::FillTrue),
            encode: Some(BooleanEncoding::YesNo),
            invert: true,
        }));
        assert_eq!(
            gated,
            ColumnOptions::Boolean(BooleanOptions {
                missing: Some(BooleanMissing::Mode),
                encode: Some(BooleanEncoding::ZeroOne),
                invert: true,
            })
        );
    }

    #[test]
    fn test_gate_drops_identifiers() {
        let gated = apply_ml_ready(ColumnOptions::Identifier(IdentifierOptions {
            drop: false,
            hash: true,
            check_duplicates: true,
        }));
        assert!(gated.is_active("drop"));
        assert!(!gated.is_active("hash"));
        assert!(!gated.is_active("check_duplicates"));
    }

    #[test]
    fn test_locked_fields_have_forced_values() {
        for (column_type, feature) in LOCKED_FIELDS {
            let forced = forced_value(*column_type, feature).unwrap();
            let gated = apply_ml_ready(ColumnOptions::empty(*column_type));
            assert_eq!(gated.is_active(feature), forced.is_active(), "{column_type}.{feature}");
            if forced.is_active() {
                assert_eq!(gated.feature(feature), Some(forced));
            }
        }
    }

    /// Options that differ from the empty set in every field the gate touches.
    fn user_choices(column_type: ColumnType) -> ColumnOptions {
        match column_type {
            ColumnType::Numeric => ColumnOptions::empty(column_type),
            ColumnType::Categorical => ColumnOptions::Categorical(CategoricalOptions {
                encoding: Some(CategoricalEncoding::Frequency),
                ..Default::default()
            }),
            ColumnType::Text => ColumnOptions::Text(TextOptions {
                vectorization: Some(Vectorization::Count),
                drop_original: true,
                ..Default::default()
            }),
            ColumnType::Datetime => ColumnOptions::Datetime(DatetimeOptions {
                extract: vec![DatetimePart::Hour],
                drop_original: true,
                ..Default::default()
            }),
            ColumnType::Boolean => ColumnOptions::Boolean(BooleanOptions {
                missing: Some(BooleanMissing::FillTrue),
                encode: Some(BooleanEncoding::YesNo),
                invert: false,
            }),
            ColumnType::Identifier => ColumnOptions::Identifier(IdentifierOptions {
                drop: true,
                hash: true,
                check_duplicates: true,
            }),
            ColumnType::Mixed => ColumnOptions::Mixed(MixedOptions {
                drop: true,
                convert_to: Some(ConvertTo::KeepAsString),
                ..Default::default()
            }),
        }
    }

    #[test]
    fn test_every_overwritten_field_is_locked() {
        for column_type in ColumnType::ALL {
            let empty = ColumnOptions::empty(column_type);
            let chosen = user_choices(column_type);
            let gated_empty = apply_ml_ready(empty.clone());
            let gated_chosen = apply_ml_ready(chosen.clone());

            for rule in rules_for(column_type) {
                let feature = rule.feature;
                let overwritten = empty.feature(feature) != chosen.feature(feature)
                    && gated_empty.feature(feature) == gated_chosen.feature(feature);
                if overwritten {
                    assert!(is_locked(column_type, feature), "{column_type}.{feature} not locked");
                    let forced = forced_value(column_type, feature).unwrap();
                    assert_eq!(gated_chosen.is_active(feature), forced.is_active());
                }
            }
        }
    }

    #[test]
    fn test_identifier_fields_locked_while_ml_ready() {
        assert!(is_locked(ColumnType::Identifier, "hash"));
        assert_eq!(
            forced_value(ColumnType::Identifier, "hash"),
            Some(FeatureValue::Flag(false))
        );
        assert_eq!(
            forced_value(ColumnType::Identifier, "drop"),
            Some(FeatureValue::Flag(true))
        );
        assert_eq!(
            forced_value(ColumnType::Boolean, "encode"),
            Some(FeatureValue::choice("0_1"))
        );
    }

    #[test]
    fn test_filtered_options() {
        assert!(!is_option_allowed(ColumnType::Boolean, "encode", "yes_no"));
        assert!(is_option_allowed(ColumnType::Boolean, "encode", "0_1"));
        assert!(!is_option_allowed(ColumnType::Mixed, "convert_to", "datetime"));
        assert!(is_option_allowed(ColumnType::Numeric, "missing", "none"));
    }

    #[test]
    fn test_panel_mode_follows_flag() {
        assert_eq!(PanelMode::from_flag(false), PanelMode::Default);
        assert!(PanelMode::from_flag(true).is_constrained());
    }
}
