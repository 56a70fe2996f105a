use tracing::warn;

use super::rules_for;
use crate::options::FeatureSet;
use crate::types::ColumnType;

/// Active features of `config` in the order the backend applies them.
///
/// A feature comes after every active feature listed in its `applied_after`;
/// otherwise table order is kept. Inactive dependencies are ignored.
pub fn application_order(column_type: ColumnType, config: &impl FeatureSet) -> Vec<&'static str> {
    let active: Vec<_> = rules_for(column_type)
        .iter()
        .filter(|rule| config.is_active(rule.feature))
        .collect();

    let mut placed = vec![false; active.len()];
    let mut order = Vec::with_capacity(active.len());

    while order.len() < active.len() {
        // First rule in table order whose active predecessors are all placed.
        let next = active.iter().enumerate().position(|(idx, rule)| {
            !placed[idx]
                && rule.applied_after.iter().all(|dep| {
                    active
                        .iter()
                        .position(|r| r.feature == *dep)
                        .is_none_or(|dep_idx| placed[dep_idx])
                })
        });

        match next {
            Some(idx) => {
                placed[idx] = true;
                order.push(active[idx].feature);
            }
            None => {
                // The table is acyclic; keep the remainder in table order if that ever breaks.
                warn!(%column_type, "Cycle in applied_after rules, falling back to table order");
                order.extend(
                    active
                        .iter()
                        .zip(&placed)
                        .filter(|(_, done)| !**done)
                        .map(|(rule, _)| rule.feature),
                );
            }
        }
    }

    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{FeatureMap, FeatureValue};
    use crate::rules::find_rule;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_numeric_pipeline_order() {
        let config = FeatureMap::new()
            .with("round", 2.0)
            .with("scaling", "standard")
            .with("log_transform", true)
            .with("missing", "median");
        assert_eq!(
            application_order(ColumnType::Numeric, &config),
            vec!["missing", "log_transform", "scaling", "round"]
        );
    }

    #[test]
    fn test_inactive_dependencies_are_ignored() {
        let config = FeatureMap::new()
            .with("vectorization", "tfidf")
            .with("drop_original", true)
            .with("lowercase", false);
        assert_eq!(
            application_order(ColumnType::Text, &config),
            vec!["vectorization", "drop_original"]
        );
    }

    #[test]
    fn test_order_respects_applied_after_for_every_type() {
        for column_type in ColumnType::ALL {
            let everything: FeatureMap = rules_for(column_type)
                .iter()
                .map(|r| (r.feature.to_string(), FeatureValue::Flag(true)))
                .collect();
            let order = application_order(column_type, &everything);
            assert_eq!(order.len(), rules_for(column_type).len());

            for (pos, feature) in order.iter().enumerate() {
                let rule = find_rule(column_type, feature).unwrap();
                for dep in rule.applied_after {
                    let dep_pos = order.iter().position(|f| f == dep).unwrap();
                    assert!(dep_pos < pos, "{column_type}: {dep} must precede {feature}");
                }
            }
        }
    }

    #[test]
    fn test_empty_config_has_no_steps() {
        assert!(application_order(ColumnType::Boolean, &FeatureMap::new()).is_empty());
    }
}
