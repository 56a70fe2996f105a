//! Option metadata per data type: default values and selectable choices.
//!
//! A built-in catalog mirrors the typed option sets. The backend can send its
//! own (`GET preprocessing/options`), shaped as
//! `{"numeric": {"missing": {"default": "mean", "options": [...]}}}`, which
//! is merged on top.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::ml_ready;
use crate::rules::{self, rules_for};
use crate::options::{
    BooleanEncoding, BooleanMissing, CategoricalEncoding, CategoricalMissing, CoerceErrors,
    ColumnOptions, ConvertTo, DatetimeMissing, DatetimePart, FeatureMap, FeatureSet, FeatureValue,
    MixedMissing, NumericMissing, OutlierHandling, Scaling, TextMissing, TimeUnit, Vectorization,
};
use crate::types::ColumnType;

/// Default and choices for one feature.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureCatalogEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<FeatureValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

impl FeatureCatalogEntry {
    fn choices(options: impl IntoIterator<Item = &'static str>) -> Self {
        Self {
            default: None,
            options: options.into_iter().map(str::to_string).collect(),
        }
    }

    fn with_default(mut self, default: impl Into<FeatureValue>) -> Self {
        self.default = Some(default.into());
        self
    }
}

type RawCatalog = BTreeMap<String, BTreeMap<String, FeatureCatalogEntry>>;

/// Option metadata keyed by data type, then feature.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawCatalog", into = "RawCatalog")]
pub struct OptionsCatalog {
    types: BTreeMap<ColumnType, BTreeMap<String, FeatureCatalogEntry>>,
}

impl From<RawCatalog> for OptionsCatalog {
    fn from(raw: RawCatalog) -> Self {
        let mut types = BTreeMap::new();
        for (key, features) in raw {
            match key.parse::<ColumnType>() {
                Ok(column_type) => {
                    types.insert(column_type, features);
                }
                Err(_) => warn!(section = %key, "Ignoring options for unknown data type"),
            }
        }
        Self { types }
    }
}

impl From<OptionsCatalog> for RawCatalog {
    fn from(catalog: OptionsCatalog) -> Self {
        catalog
            .types
            .into_iter()
            .map(|(column_type, features)| (column_type.key().to_string(), features))
            .collect()
    }
}

/// What a panel shows for one field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldState {
    /// Choices offered, already narrowed for ML-Ready.
    pub options: Vec<String>,
    /// `false` when the field is locked.
    pub editable: bool,
    /// Value a locked field is held at.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forced: Option<FeatureValue>,
}

fn names<T>(all: &[T], name: fn(&T) -> &'static str) -> Vec<&'static str> {
    all.iter().map(name).collect()
}

impl OptionsCatalog {
    /// The catalog matching the typed option sets.
    pub fn builtin() -> Self {
        let mut catalog = Self::default();

        catalog.insert(
            ColumnType::Numeric,
            [
                (
                    "missing",
                    FeatureCatalogEntry::choices(names(NumericMissing::ALL, NumericMissing::as_str))
                        .with_default(NumericMissing::Mean),
                ),
                (
                    "outliers",
                    FeatureCatalogEntry::choices(names(OutlierHandling::ALL, OutlierHandling::as_str))
                        .with_default(OutlierHandling::None),
                ),
                ("log_transform", FeatureCatalogEntry::default()),
                ("power_transform", FeatureCatalogEntry::default()),
                (
                    "scaling",
                    FeatureCatalogEntry::choices(names(Scaling::ALL, Scaling::as_str))
                        .with_default(Scaling::None),
                ),
                ("binning", FeatureCatalogEntry::default()),
                ("round", FeatureCatalogEntry::default()),
            ],
        );

        catalog.insert(
            ColumnType::Categorical,
            [
                (
                    "missing",
                    FeatureCatalogEntry::choices(names(
                        CategoricalMissing::ALL,
                        CategoricalMissing::as_str,
                    ))
                    .with_default(CategoricalMissing::Mode),
                ),
                ("strip_whitespace", FeatureCatalogEntry::default()),
                ("lowercase", FeatureCatalogEntry::default()),
                ("merge_rare", FeatureCatalogEntry::default()),
                ("top_n_categories", FeatureCatalogEntry::default()),
                (
                    "encoding",
                    FeatureCatalogEntry::choices(names(
                        CategoricalEncoding::ALL,
                        CategoricalEncoding::as_str,
                    ))
                    .with_default(CategoricalEncoding::None),
                ),
            ],
        );

        catalog.insert(
            ColumnType::Text,
            [
                (
                    "missing",
                    FeatureCatalogEntry::choices(names(TextMissing::ALL, TextMissing::as_str))
                        .with_default(TextMissing::EmptyString),
                ),
                ("lowercase", FeatureCatalogEntry::default()),
                ("remove_punctuation", FeatureCatalogEntry::default()),
                ("tokenize", FeatureCatalogEntry::default()),
                ("remove_stopwords", FeatureCatalogEntry::default()),
                ("stemming", FeatureCatalogEntry::default()),
                ("lemmatization", FeatureCatalogEntry::default()),
                (
                    "vectorization",
                    FeatureCatalogEntry::choices(names(Vectorization::ALL, Vectorization::as_str))
                        .with_default(Vectorization::None),
                ),
                ("max_features", FeatureCatalogEntry::default()),
                ("drop_original", FeatureCatalogEntry::default()),
            ],
        );

        catalog.insert(
            ColumnType::Datetime,
            [
                (
                    "missing",
                    FeatureCatalogEntry::choices(names(DatetimeMissing::ALL, DatetimeMissing::as_str))
                        .with_default(DatetimeMissing::None),
                ),
                (
                    "extract",
                    FeatureCatalogEntry::choices(names(DatetimePart::ALL, DatetimePart::as_str)),
                ),
                ("cyclical_encoding", FeatureCatalogEntry::default()),
                (
                    "time_since",
                    FeatureCatalogEntry::choices(names(TimeUnit::ALL, TimeUnit::as_str)),
                ),
                ("drop_original", FeatureCatalogEntry::default()),
            ],
        );

        catalog.insert(
            ColumnType::Boolean,
            [
                (
                    "missing",
                    FeatureCatalogEntry::choices(names(BooleanMissing::ALL, BooleanMissing::as_str))
                        .with_default(BooleanMissing::Mode),
                ),
                (
                    "encode",
                    FeatureCatalogEntry::choices(names(BooleanEncoding::ALL, BooleanEncoding::as_str))
                        .with_default(BooleanEncoding::Keep),
                ),
                ("invert", FeatureCatalogEntry::default()),
            ],
        );

        catalog.insert(
            ColumnType::Identifier,
            [
                ("drop", FeatureCatalogEntry::default()),
                ("hash", FeatureCatalogEntry::default()),
                ("check_duplicates", FeatureCatalogEntry::default()),
            ],
        );

        catalog.insert(
            ColumnType::Mixed,
            [
                ("drop", FeatureCatalogEntry::default()),
                (
                    "missing",
                    FeatureCatalogEntry::choices(names(MixedMissing::ALL, MixedMissing::as_str))
                        .with_default(MixedMissing::None),
                ),
                (
                    "convert_to",
                    FeatureCatalogEntry::choices(names(ConvertTo::ALL, ConvertTo::as_str))
                        .with_default(ConvertTo::KeepAsString),
                ),
                (
                    "coerce_errors",
                    FeatureCatalogEntry::choices(names(CoerceErrors::ALL, CoerceErrors::as_str)),
                ),
            ],
        );

        catalog
    }

    fn insert<const N: usize>(
        &mut self,
        column_type: ColumnType,
        entries: [(&str, FeatureCatalogEntry); N],
    ) {
        let features = self.types.entry(column_type).or_default();
        for (feature, entry) in entries {
            features.insert(feature.to_string(), entry);
        }
    }

    /// Overlay `other` on this catalog.
    ///
    /// A non-empty choice list from `other` replaces ours; a default from
    /// `other` replaces ours. Features only one side knows are kept.
    pub fn merge(mut self, other: OptionsCatalog) -> Self {
        for (column_type, features) in other.types {
            let ours = self.types.entry(column_type).or_default();
            for (feature, entry) in features {
                let slot = ours.entry(feature).or_default();
                if !entry.options.is_empty() {
                    slot.options = entry.options;
                }
                if entry.default.is_some() {
                    slot.default = entry.default;
                }
            }
        }
        self
    }

    pub fn entry(&self, column_type: ColumnType, feature: &str) -> Option<&FeatureCatalogEntry> {
        self.types.get(&column_type)?.get(feature)
    }

    /// Features known for a data type, in name order.
    pub fn features(&self, column_type: ColumnType) -> impl Iterator<Item = &str> {
        self.types
            .get(&column_type)
            .into_iter()
            .flat_map(|features| features.keys().map(String::as_str))
    }

    /// Choices to offer for a feature, narrowed when ML-Ready is on.
    pub fn options_for(&self, column_type: ColumnType, feature: &str, ml_ready: bool) -> Vec<String> {
        self.entry(column_type, feature)
            .map(|entry| {
                entry
                    .options
                    .iter()
                    .filter(|value| !ml_ready || ml_ready::is_option_allowed(column_type, feature, value))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// What a panel renders for one field.
    pub fn field_state(&self, column_type: ColumnType, feature: &str, ml_ready: bool) -> FieldState {
        let locked = ml_ready && ml_ready::is_locked(column_type, feature);
        FieldState {
            options: self.options_for(column_type, feature, ml_ready),
            editable: !locked,
            forced: locked
                .then(|| ml_ready::forced_value(column_type, feature))
                .flatten(),
        }
    }

    /// Options for a data type seeded from the catalog defaults.
    ///
    /// With ML-Ready on, the defaults are passed through the gate. A default
    /// the typed options reject (for example a backend value this crate does not
    /// know) is dropped with a warning, and so is a default that conflicts with
    /// an earlier one in rule order or lacks its requirement.
    pub fn default_options(&self, column_type: ColumnType, ml_ready: bool) -> ColumnOptions {
        let defaults: FeatureMap = self
            .types
            .get(&column_type)
            .into_iter()
            .flatten()
            .filter_map(|(feature, entry)| {
                let default = entry.default.clone()?;
                let single = FeatureMap::new().with(feature.as_str(), default.clone());
                match ColumnOptions::from_feature_map(column_type, &single) {
                    Ok(_) => Some((feature.clone(), default)),
                    Err(e) => {
                        warn!(%column_type, feature = %feature, "Dropping unusable default: {}", e);
                        None
                    }
                }
            })
            .collect();

        let defaults = consistent_defaults(column_type, defaults);

        let options = ColumnOptions::from_feature_map(column_type, &defaults).unwrap_or_else(|e| {
            warn!(%column_type, "Ignoring catalog defaults: {}", e);
            ColumnOptions::empty(column_type)
        });

        debug!(%column_type, ml_ready, "Seeded default options");
        if ml_ready {
            ml_ready::apply_ml_ready(options)
        } else {
            options
        }
    }
}

/// Keep defaults in rule order, skipping any that conflict with one already
/// kept, then drop those whose requirements are not met.
fn consistent_defaults(column_type: ColumnType, defaults: FeatureMap) -> FeatureMap {
    let mut kept = FeatureMap::new();
    for rule in rules_for(column_type) {
        let Some(value) = defaults.feature(rule.feature) else {
            continue;
        };
        if value.is_active() && rules::has_conflict(column_type, rule.feature, &kept) {
            warn!(%column_type, feature = rule.feature, "Dropping conflicting default");
            continue;
        }
        kept.insert(rule.feature, value);
    }

    loop {
        let unmet: Vec<&str> = rules_for(column_type)
            .iter()
            .filter(|rule| {
                kept.is_active(rule.feature)
                    && rules::is_required_missing(column_type, rule.feature, &kept)
            })
            .map(|rule| rule.feature)
            .collect();
        if unmet.is_empty() {
            break;
        }
        for feature in unmet {
            warn!(%column_type, feature, "Dropping default with unmet requirement");
            kept.remove(feature);
        }
    }

    let validation = rules::validate_configuration(column_type, &kept);
    if !validation.valid {
        warn!(%column_type, errors = ?validation.errors, "Catalog defaults still inconsistent");
    }
    kept
}
