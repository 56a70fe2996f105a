use serde::{Deserialize, Serialize};

use super::{FeatureSet, FeatureValue, flag, is_false};

option_enum! {
    CategoricalMissing {
        None => "none",
        Drop => "drop",
        Mode => "mode",
        Constant => "constant",
        /// Treat missing as its own category.
        UnknownCategory => "unknown_category",
    }
}

option_enum! {
    /// `None` keeps the column as text.
    CategoricalEncoding {
        None => "none",
        OneHot => "one_hot",
        Label => "label",
        Ordinal => "ordinal",
        Frequency => "frequency",
        Target => "target",
    }
}

/// Merge categories rarer than `threshold` (fraction of rows) into "Other".
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MergeRare {
    pub threshold: f64,
}

/// Keep the `n` most frequent categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopN {
    pub n: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CategoricalOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing: Option<CategoricalMissing>,
    #[serde(skip_serializing_if = "is_false")]
    pub strip_whitespace: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub lowercase: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merge_rare: Option<MergeRare>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_n_categories: Option<TopN>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoding: Option<CategoricalEncoding>,
}

impl FeatureSet for CategoricalOptions {
    fn feature(&self, feature: &str) -> Option<FeatureValue> {
        match feature {
            "missing" => self.missing.map(Into::into),
            "strip_whitespace" => flag(self.strip_whitespace),
            "lowercase" => flag(self.lowercase),
            "merge_rare" => self.merge_rare.map(|m| FeatureValue::Threshold {
                threshold: m.threshold,
            }),
            "top_n_categories" => self.top_n_categories.map(|t| FeatureValue::TopN { n: t.n }),
            "encoding" => self.encoding.map(Into::into),
            _ => None,
        }
    }
}
