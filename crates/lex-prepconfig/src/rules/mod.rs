//! Feature compatibility rules.
//!
//! Every column type has an ordered list of [`FeatureRule`]s declaring which
//! features conflict, which need another feature switched on first and which
//! run after which. The evaluator answers per-feature questions for a panel,
//! the validator checks a whole column configuration, and [`application_order`]
//! derives the order the backend applies the active features in.

mod evaluator;
mod ordering;
mod table;
mod validator;

pub use evaluator::{get_disabled_reason, has_conflict, is_required_missing};
pub use ordering::application_order;
pub use table::{find_rule, rules_for};
pub use validator::{ValidationResult, validate_configuration};

use serde::Serialize;

/// Compatibility rule for one feature of one column type.
///
/// A rule whose `conflicts` list names the feature itself marks the feature as
/// single-select. That self-reference is never treated as a conflict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeatureRule {
    pub feature: &'static str,
    pub conflicts: &'static [&'static str],
    pub requires: &'static [&'static str],
    pub applied_after: &'static [&'static str],
}

impl FeatureRule {
    /// Whether only one value of this feature may be active at a time.
    pub fn is_single_select(&self) -> bool {
        self.conflicts.contains(&self.feature)
    }

    /// Conflicting features other than the feature itself.
    pub fn real_conflicts(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.conflicts
            .iter()
            .copied()
            .filter(move |other| *other != self.feature)
    }
}

/// Join feature names for messages: `", "` for conflicts, `" or "` for requirements.
pub(crate) fn join_features<'a>(features: impl IntoIterator<Item = &'a str>, sep: &str) -> String {
    features.into_iter().collect::<Vec<_>>().join(sep)
}
