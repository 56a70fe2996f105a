use once_cell::sync::Lazy;
use std::collections::HashMap;

use super::FeatureRule;
use crate::types::ColumnType;

const fn rule(
    feature: &'static str,
    conflicts: &'static [&'static str],
    requires: &'static [&'static str],
    applied_after: &'static [&'static str],
) -> FeatureRule {
    FeatureRule {
        feature,
        conflicts,
        requires,
        applied_after,
    }
}

const CATEGORY_REDUCTION_AFTER: &[&str] = &["missing", "strip_whitespace", "lowercase"];
const TEXT_NORMALIZATION_AFTER: &[&str] = &["tokenize", "remove_stopwords"];

static RULES: Lazy<HashMap<ColumnType, Vec<FeatureRule>>> = Lazy::new(|| {
    let mut rules = HashMap::new();

    rules.insert(
        ColumnType::Numeric,
        vec![
            rule("missing", &["missing"], &[], &[]),
            rule("outliers", &["outliers"], &[], &["missing"]),
            rule("log_transform", &["power_transform"], &[], &["missing", "outliers"]),
            rule("power_transform", &["log_transform"], &[], &["missing", "outliers"]),
            rule(
                "scaling",
                &["scaling", "binning"],
                &[],
                &["missing", "outliers", "log_transform", "power_transform"],
            ),
            rule("binning", &["scaling", "round"], &[], &["missing", "outliers"]),
            rule("round", &["binning"], &[], &["scaling"]),
        ],
    );

    rules.insert(
        ColumnType::Categorical,
        vec![
            rule("missing", &["missing"], &[], &[]),
            rule("strip_whitespace", &[], &[], &[]),
            rule("lowercase", &[], &[], &["strip_whitespace"]),
            rule("merge_rare", &["top_n_categories"], &[], CATEGORY_REDUCTION_AFTER),
            rule("top_n_categories", &["merge_rare"], &[], CATEGORY_REDUCTION_AFTER),
            rule("encoding", &["encoding"], &[], &["merge_rare", "top_n_categories"]),
        ],
    );

    rules.insert(
        ColumnType::Text,
        vec![
            rule("missing", &["missing"], &[], &[]),
            rule("lowercase", &[], &[], &["missing"]),
            rule("remove_punctuation", &[], &[], &["missing"]),
            rule("tokenize", &[], &[], &["lowercase", "remove_punctuation"]),
            rule("remove_stopwords", &[], &["tokenize"], &["tokenize"]),
            rule("stemming", &["lemmatization"], &["tokenize"], TEXT_NORMALIZATION_AFTER),
            rule("lemmatization", &["stemming"], &["tokenize"], TEXT_NORMALIZATION_AFTER),
            rule(
                "vectorization",
                &["vectorization"],
                &[],
                &[
                    "lowercase",
                    "remove_punctuation",
                    "remove_stopwords",
                    "stemming",
                    "lemmatization",
                ],
            ),
            rule("max_features", &[], &["vectorization"], &[]),
            rule("drop_original", &[], &["vectorization"], &["vectorization"]),
        ],
    );

    rules.insert(
        ColumnType::Datetime,
        vec![
            rule("missing", &["missing"], &[], &[]),
            rule("extract", &[], &[], &["missing"]),
            rule("cyclical_encoding", &[], &["extract"], &["extract"]),
            rule("time_since", &[], &[], &["missing"]),
            rule(
                "drop_original",
                &[],
                &["extract", "time_since"],
                &["extract", "time_since"],
            ),
        ],
    );

    rules.insert(
        ColumnType::Boolean,
        vec![
            rule("missing", &["missing"], &[], &[]),
            rule("encode", &["encode"], &[], &["missing"]),
            rule("invert", &[], &[], &["encode"]),
        ],
    );

    rules.insert(
        ColumnType::Identifier,
        vec![
            rule("drop", &["hash", "check_duplicates"], &[], &[]),
            rule("hash", &["drop"], &[], &[]),
            rule("check_duplicates", &["drop"], &[], &[]),
        ],
    );

    rules.insert(
        ColumnType::Mixed,
        vec![
            rule("drop", &[], &[], &[]),
            rule("missing", &["missing"], &[], &[]),
            rule("convert_to", &["convert_to"], &[], &["missing"]),
            rule("coerce_errors", &[], &["convert_to"], &["convert_to"]),
        ],
    );

    rules
});

/// Ordered rules for a column type.
pub fn rules_for(column_type: ColumnType) -> &'static [FeatureRule] {
    RULES.get(&column_type).map(Vec::as_slice).unwrap_or(&[])
}

/// Rule for one feature, if the column type declares it.
pub fn find_rule(column_type: ColumnType, feature: &str) -> Option<&'static FeatureRule> {
    rules_for(column_type).iter().find(|r| r.feature == feature)
}
