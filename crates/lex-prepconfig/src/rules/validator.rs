use serde::Serialize;
use std::collections::HashSet;

use super::{join_features, rules_for};
use crate::options::FeatureSet;
use crate::types::ColumnType;

/// Outcome of checking one column configuration against the rule table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl ValidationResult {
    fn from_errors(errors: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }
}

/// Check every active feature of `config` for conflicts and missing
/// requirements.
///
/// Rules are walked in table order. A conflicting pair is reported once, named
/// by whichever of the two comes first in the table.
pub fn validate_configuration(column_type: ColumnType, config: &impl FeatureSet) -> ValidationResult {
    let mut errors = Vec::new();
    let mut reported: HashSet<(&str, &str)> = HashSet::new();

    for rule in rules_for(column_type) {
        if !config.is_active(rule.feature) {
            continue;
        }

        for other in rule.real_conflicts() {
            if !config.is_active(other) {
                continue;
            }
            let pair = if rule.feature < other {
                (rule.feature, other)
            } else {
                (other, rule.feature)
            };
            if reported.insert(pair) {
                errors.push(format!(
                    "{} conflicts with {other}. Please disable one of them.",
                    rule.feature
                ));
            }
        }

        if !rule.requires.is_empty() && !rule.requires.iter().any(|req| config.is_active(req)) {
            errors.push(format!(
                "{} requires {} to be enabled.",
                rule.feature,
                join_features(rule.requires.iter().copied(), " or ")
            ));
        }
    }

    ValidationResult::from_errors(errors)
}
