use serde::{Deserialize, Serialize};

use super::{FeatureSet, FeatureValue, flag, is_false};

option_enum! {
    MixedMissing {
        None => "none",
        Drop => "drop",
        Mode => "mode",
    }
}

option_enum! {
    ConvertTo {
        Numeric => "numeric",
        Datetime => "datetime",
        KeepAsString => "keep_as_string",
    }
}

option_enum! {
    /// What to do with values that fail conversion.
    CoerceErrors {
        Null => "null",
        DropRow => "drop_row",
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MixedOptions {
    #[serde(skip_serializing_if = "is_false")]
    pub drop: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing: Option<MixedMissing>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub convert_to: Option<ConvertTo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coerce_errors: Option<CoerceErrors>,
}

impl FeatureSet for MixedOptions {
    fn feature(&self, feature: &str) -> Option<FeatureValue> {
        match feature {
            "drop" => flag(self.drop),
            "missing" => self.missing.map(Into::into),
            "convert_to" => self.convert_to.map(Into::into),
            "coerce_errors" => self.coerce_errors.map(Into::into),
            _ => None,
        }
    }
}
