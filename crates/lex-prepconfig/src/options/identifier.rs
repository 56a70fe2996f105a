use serde::{Deserialize, Serialize};

use super::{FeatureSet, FeatureValue, flag, is_false};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IdentifierOptions {
    #[serde(skip_serializing_if = "is_false")]
    pub drop: bool,
    /// Replace values with a stable hash.
    #[serde(skip_serializing_if = "is_false")]
    pub hash: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub check_duplicates: bool,
}

impl FeatureSet for IdentifierOptions {
    fn feature(&self, feature: &str) -> Option<FeatureValue> {
        match feature {
            "drop" => flag(self.drop),
            "hash" => flag(self.hash),
            "check_duplicates" => flag(self.check_duplicates),
            _ => None,
        }
    }
}
