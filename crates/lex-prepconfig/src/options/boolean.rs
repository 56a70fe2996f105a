use serde::{Deserialize, Serialize};

use super::{FeatureSet, FeatureValue, flag, is_false};

option_enum! {
    BooleanMissing {
        None => "none",
        Drop => "drop",
        Mode => "mode",
        FillTrue => "fill_true",
        FillFalse => "fill_false",
    }
}

option_enum! {
    BooleanEncoding {
        /// Keep the boolean column as-is.
        Keep => "keep",
        ZeroOne => "0_1",
        YesNo => "yes_no",
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BooleanOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing: Option<BooleanMissing>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encode: Option<BooleanEncoding>,
    #[serde(skip_serializing_if = "is_false")]
    pub invert: bool,
}

impl FeatureSet for BooleanOptions {
    fn feature(&self, feature: &str) -> Option<FeatureValue> {
        match feature {
            "missing" => self.missing.map(Into::into),
            "encode" => self.encode.map(Into::into),
            "invert" => flag(self.invert),
            _ => None,
        }
    }
}
