// ── Unordered rule collection ──

use serde::{Deserialize, Serialize};

use super::rule::{FirewallRule, RuleInput};
use crate::error::ValidationError;
use crate::validate;

/// The complete set of rules that should be active on an instance.
///
/// A bag, not a sequence: equality ignores order but counts duplicates.
/// Duplicates are kept because conflicts are for the remote service to judge.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleSet(Vec<FirewallRule>);

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate user-supplied rules at the boundary.
    ///
    /// Fails on the first bad field, reporting the rule's position.
    pub fn from_inputs(inputs: &[RuleInput]) -> Result<Self, ValidationError> {
        inputs
            .iter()
            .enumerate()
            .map(|(index, input)| {
                validate::rule_from_parts(
                    &input.services,
                    &input.ports,
                    &input.ip,
                    input.description.as_deref(),
                )
                .map_err(|e| e.in_rule(index))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }

    pub fn push(&mut self, rule: FirewallRule) {
        self.0.push(rule);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FirewallRule> {
        self.0.iter()
    }

    /// Rules in canonical order, for stable display and comparison.
    pub fn sorted(&self) -> Vec<&FirewallRule> {
        let mut rules: Vec<&FirewallRule> = self.0.iter().collect();
        rules.sort();
        rules
    }
}

impl PartialEq for RuleSet {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.sorted() == other.sorted()
    }
}

impl Eq for RuleSet {}

impl FromIterator<FirewallRule> for RuleSet {
    fn from_iter<I: IntoIterator<Item = FirewallRule>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<Vec<FirewallRule>> for RuleSet {
    fn from(rules: Vec<FirewallRule>) -> Self {
        Self(rules)
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a FirewallRule;
    type IntoIter = std::slice::Iter<'a, FirewallRule>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for RuleSet {
    type Item = FirewallRule;
    type IntoIter = std::vec::IntoIter<FirewallRule>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::Service;

    fn office() -> FirewallRule {
        FirewallRule::new("10.56.72.0/24")
            .with_services([Service::Amqps])
            .with_description("office")
    }

    fn anywhere() -> FirewallRule {
        FirewallRule::new("0.0.0.0/0")
    }

    #[test]
    fn equality_ignores_order() {
        let a: RuleSet = vec![office(), anywhere()].into();
        let b: RuleSet = vec![anywhere(), office()].into();
        assert_eq!(a, b);
    }

    #[test]
    fn equality_counts_duplicates() {
        let a: RuleSet = vec![office(), office(), anywhere()].into();
        let b: RuleSet = vec![office(), anywhere(), anywhere()].into();
        assert_ne!(a, b);
    }

    #[test]
    fn duplicates_are_kept() {
        let set: RuleSet = vec![anywhere(), anywhere()].into();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn from_inputs_reports_rule_position() {
        let inputs = vec![
            RuleInput {
                services: vec!["amqp".into()],
                ports: vec![],
                ip: "10.0.0.0/24".into(),
                description: None,
            },
            RuleInput {
                services: vec!["HTTP".into()],
                ports: vec![],
                ip: "10.0.0.0/24".into(),
                description: None,
            },
        ];
        let err = RuleSet::from_inputs(&inputs).unwrap_err();
        assert!(matches!(err, ValidationError::InRule { index: 1, .. }));
        assert!(matches!(
            err.field_error(),
            ValidationError::InvalidServiceName { value, .. } if value == "HTTP"
        ));
    }

    #[test]
    fn serializes_as_plain_list() {
        let set: RuleSet = vec![anywhere()].into();
        assert_eq!(
            serde_json::to_string(&set).unwrap(),
            r#"[{"services":[],"ports":[],"ip":"0.0.0.0/0"}]"#
        );
    }
}
