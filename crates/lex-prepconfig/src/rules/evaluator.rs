use tracing::debug;

use super::{find_rule, join_features};
use crate::options::{FeatureSet, FeatureValue};
use crate::types::ColumnType;

/// Whether a feature other than `feature` itself that conflicts with it is
/// active. Unknown features never conflict.
pub fn has_conflict(column_type: ColumnType, feature: &str, config: &impl FeatureSet) -> bool {
    find_rule(column_type, feature)
        .is_some_and(|rule| rule.real_conflicts().any(|other| config.is_active(other)))
}

/// Whether the feature declares requirements and none of them is active.
pub fn is_required_missing(
    column_type: ColumnType,
    feature: &str,
    config: &impl FeatureSet,
) -> bool {
    find_rule(column_type, feature).is_some_and(|rule| {
        !rule.requires.is_empty() && !rule.requires.iter().any(|req| config.is_active(req))
    })
}

/// Explains why choosing `option_value` for `feature` is not possible right
/// now, or `None` when it is.
///
/// Picking an inactive value ("none", `false`, an empty list) is always allowed
/// so a user can back out of any state. Conflicts are reported before missing
/// requirements.
pub fn get_disabled_reason(
    column_type: ColumnType,
    feature: &str,
    option_value: &FeatureValue,
    config: &impl FeatureSet,
) -> Option<String> {
    if !option_value.is_active() {
        return None;
    }
    let rule = find_rule(column_type, feature)?;

    let active_conflicts: Vec<&str> = rule
        .real_conflicts()
        .filter(|other| config.is_active(other))
        .collect();
    if !active_conflicts.is_empty() {
        debug!(%column_type, feature, conflicts = ?active_conflicts, "Option disabled by conflict");
        return Some(format!(
            "Cannot be combined with {}. Disable it first.",
            join_features(active_conflicts, ", ")
        ));
    }

    if is_required_missing(column_type, feature, config) {
        return Some(format!(
            "Requires {} to be enabled first.",
            join_features(rule.requires.iter().copied(), " or ")
        ));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::FeatureMap;

    fn on(value: &str) -> FeatureValue {
        FeatureValue::choice(value)
    }

    // ==================== has_conflict tests ====================

    #[test]
    fn test_has_conflict_detects_active_other() {
        let config = FeatureMap::new().with("log_transform", true);
        assert!(has_conflict(ColumnType::Numeric, "power_transform", &config));
        assert!(!has_conflict(ColumnType::Numeric, "scaling", &config));
    }

    #[test]
    fn test_self_reference_is_not_a_conflict() {
        let config = FeatureMap::new().with("encoding", "one_hot");
        assert!(!has_conflict(ColumnType::Categorical, "encoding", &config));
    }

    #[test]
    fn test_inactive_other_is_not_a_conflict() {
        let config = FeatureMap::new().with("scaling", "none");
        assert!(!has_conflict(ColumnType::Numeric, "binning", &config));
    }

    #[test]
    fn test_unknown_feature_never_conflicts() {
        let config = FeatureMap::new().with("drop", true);
        assert!(!has_conflict(ColumnType::Identifier, "shuffle", &config));
    }

    // ==================== is_required_missing tests ====================

    #[test]
    fn test_requirement_missing_until_any_enabled() {
        let empty = FeatureMap::new();
        assert!(is_required_missing(ColumnType::Datetime, "drop_original", &empty));

        let with_time_since =
            FeatureMap::new().with("time_since", FeatureValue::Unit { unit: "days".to_string() });
        assert!(!is_required_missing(
            ColumnType::Datetime,
            "drop_original",
            &with_time_since
        ));
    }

    #[test]
    fn test_rule_without_requirements() {
        assert!(!is_required_missing(ColumnType::Text, "tokenize", &FeatureMap::new()));
    }

    // ==================== get_disabled_reason tests ====================

    #[test]
    fn test_reason_for_conflict() {
        let config = FeatureMap::new().with("merge_rare", FeatureValue::Threshold { threshold: 0.05 });
        let reason = get_disabled_reason(
            ColumnType::Categorical,
            "top_n_categories",
            &FeatureValue::TopN { n: 10 },
            &config,
        );
        assert_eq!(
            reason.as_deref(),
            Some("Cannot be combined with merge_rare. Disable it first.")
        );
    }

    #[test]
    fn test_reason_lists_every_active_conflict() {
        let config = FeatureMap::new().with("hash", true).with("check_duplicates", true);
        let reason = get_disabled_reason(ColumnType::Identifier, "drop", &true.into(), &config);
        assert_eq!(
            reason.as_deref(),
            Some("Cannot be combined with hash, check_duplicates. Disable it first.")
        );
    }

    #[test]
    fn test_reason_for_missing_requirement() {
        let reason = get_disabled_reason(
            ColumnType::Datetime,
            "drop_original",
            &true.into(),
            &FeatureMap::new(),
        );
        assert_eq!(
            reason.as_deref(),
            Some("Requires extract or time_since to be enabled first.")
        );
    }

    #[test]
    fn test_conflict_reason_wins_over_requirement() {
        let config = FeatureMap::new().with("lemmatization", true);
        let reason = get_disabled_reason(ColumnType::Text, "stemming", &true.into(), &config);
        assert!(reason.unwrap().starts_with("Cannot be combined with lemmatization"));
    }

    #[test]
    fn test_inactive_option_value_is_always_allowed() {
        let config = FeatureMap::new().with("binning", FeatureValue::Bins { bins: 4 });
        assert_eq!(
            get_disabled_reason(ColumnType::Numeric, "scaling", &on("none"), &config),
            None
        );
        assert!(
            get_disabled_reason(ColumnType::Numeric, "scaling", &on("standard"), &config).is_some()
        );
    }

    #[test]
    fn test_single_select_gives_no_reason() {
        let config = FeatureMap::new().with("encoding", "label");
        assert_eq!(
            get_disabled_reason(ColumnType::Categorical, "encoding", &on("one_hot"), &config),
            None
        );
    }
}
