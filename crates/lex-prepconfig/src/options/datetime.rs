use serde::{Deserialize, Serialize};

use super::{FeatureSet, FeatureValue, flag, is_false};

option_enum! {
    DatetimeMissing {
        None => "none",
        Drop => "drop",
        ForwardFill => "forward_fill",
        BackwardFill => "backward_fill",
    }
}

option_enum! {
    /// Component extracted into its own numeric column.
    DatetimePart {
        Year => "year",
        Month => "month",
        Day => "day",
        Weekday => "weekday",
        Hour => "hour",
        Minute => "minute",
        Quarter => "quarter",
        IsWeekend => "is_weekend",
    }
}

option_enum! {
    TimeUnit {
        Seconds => "seconds",
        Minutes => "minutes",
        Hours => "hours",
        Days => "days",
    }
}

/// Elapsed time since a reference point, expressed in `unit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSince {
    pub unit: TimeUnit,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatetimeOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing: Option<DatetimeMissing>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extract: Vec<DatetimePart>,
    #[serde(skip_serializing_if = "is_false")]
    pub cyclical_encoding: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_since: Option<TimeSince>,
    #[serde(skip_serializing_if = "is_false")]
    pub drop_original: bool,
}

impl FeatureSet for DatetimeOptions {
    fn feature(&self, feature: &str) -> Option<FeatureValue> {
        match feature {
            "missing" => self.missing.map(Into::into),
            "extract" => (!self.extract.is_empty())
                .then(|| FeatureValue::list(self.extract.iter().map(|p| p.as_str()))),
            "cyclical_encoding" => flag(self.cyclical_encoding),
            "time_since" => self.time_since.map(|t| FeatureValue::Unit {
                unit: t.unit.as_str().to_string(),
            }),
            "drop_original" => flag(self.drop_original),
            _ => None,
        }
    }
}
