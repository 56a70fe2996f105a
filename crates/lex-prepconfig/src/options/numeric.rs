use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

use super::{FeatureSet, FeatureValue, flag, is_false};

option_enum! {
    /// How missing numeric values are handled.
    NumericMissing {
        None => "none",
        Drop => "drop",
        Mean => "mean",
        Median => "median",
        Mode => "mode",
        Zero => "zero",
    }
}

option_enum! {
    /// Outlier treatment.
    OutlierHandling {
        None => "none",
        /// Clip to the IQR fences.
        ClipIqr => "clip_iqr",
        /// Drop rows outside the IQR fences.
        RemoveIqr => "remove_iqr",
        Zscore => "zscore",
    }
}

option_enum! {
    Scaling {
        None => "none",
        Standard => "standard",
        MinMax => "minmax",
        Robust => "robust",
    }
}

/// Equal-width binning into `bins` buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binning {
    pub bins: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NumericOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing: Option<NumericMissing>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outliers: Option<OutlierHandling>,
    #[serde(skip_serializing_if = "is_false")]
    pub log_transform: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub power_transform: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scaling: Option<Scaling>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub binning: Option<Binning>,
    /// Decimal places to round to.
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "decimal_places"
    )]
    pub round: Option<u32>,
}

impl FeatureSet for NumericOptions {
    fn feature(&self, feature: &str) -> Option<FeatureValue> {
        match feature {
            "missing" => self.missing.map(Into::into),
            "outliers" => self.outliers.map(Into::into),
            "log_transform" => flag(self.log_transform),
            "power_transform" => flag(self.power_transform),
            "scaling" => self.scaling.map(Into::into),
            "binning" => self.binning.map(|b| FeatureValue::Bins { bins: b.bins }),
            "round" => self.round.map(|d| FeatureValue::Number(f64::from(d))),
            _ => None,
        }
    }
}

/// Accepts `2` as well as `2.0`, since untyped feature maps carry numbers as floats.
fn decimal_places<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<f64>::deserialize(deserializer)?
        .map(|places| {
            if places.fract() == 0.0 && (0.0..=f64::from(u32::MAX)).contains(&places) {
                Ok(places as u32)
            } else {
                Err(D::Error::custom(format!("invalid decimal places: {places}")))
            }
        })
        .transpose()
}
