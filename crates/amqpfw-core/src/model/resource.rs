// ── Reconciled resource ──

use serde::{Deserialize, Serialize};

use super::rule::RuleInput;
use super::rule_set::RuleSet;
use crate::error::{CoreError, ValidationError};

/// Local state of one instance's firewall configuration.
///
/// `id` is `None` until Create or Import succeeds; afterwards it holds the
/// base-10 form of `instance_id` (one configuration per instance).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirewallResource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub instance_id: i64,
    #[serde(default)]
    pub rules: RuleSet,
}

impl FirewallResource {
    /// A resource that does not exist remotely yet.
    pub fn absent() -> Self {
        Self::default()
    }

    pub fn is_present(&self) -> bool {
        self.id.is_some()
    }

    /// The identifier parsed back into an instance id.
    pub fn parsed_id(&self) -> Result<i64, CoreError> {
        match self.id.as_deref() {
            Some(id) => parse_instance_id(id),
            None => Err(CoreError::IdentifierParse { id: None }),
        }
    }

    /// Whether the remote state already matches `desired`.
    pub fn matches(&self, desired: &DesiredFirewall) -> bool {
        self.instance_id == desired.instance_id && self.rules == desired.rules
    }
}

/// Parse an external identifier as an integer instance id.
pub(crate) fn parse_instance_id(id: &str) -> Result<i64, CoreError> {
    id.trim()
        .parse::<i64>()
        .map_err(|_| CoreError::IdentifierParse {
            id: Some(id.to_owned()),
        })
}

/// What the orchestrator wants: an instance and the rules it should expose.
///
/// Deserializing validates every rule, so a loaded `DesiredFirewall` is
/// always fit to send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RulesFile")]
pub struct DesiredFirewall {
    pub instance_id: i64,
    pub rules: RuleSet,
}

impl DesiredFirewall {
    pub fn new(instance_id: i64, rules: RuleSet) -> Self {
        Self { instance_id, rules }
    }

    /// Validate raw rule inputs for `instance_id`.
    pub fn from_inputs(instance_id: i64, inputs: &[RuleInput]) -> Result<Self, ValidationError> {
        Ok(Self::new(instance_id, RuleSet::from_inputs(inputs)?))
    }
}

/// On-disk shape of a rules file, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RulesFile {
    pub instance_id: i64,
    pub rules: Vec<RuleInput>,
}

impl TryFrom<RulesFile> for DesiredFirewall {
    type Error = ValidationError;

    fn try_from(file: RulesFile) -> Result<Self, Self::Error> {
        Self::from_inputs(file.instance_id, &file.rules)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::model::{FirewallRule, Service};

    #[test]
    fn absent_resource_has_no_identifier() {
        let res = FirewallResource::absent();
        assert!(!res.is_present());
        assert!(matches!(
            res.parsed_id(),
            Err(CoreError::IdentifierParse { id: None })
        ));
    }

    #[test]
    fn malformed_identifier_is_reported() {
        let res = FirewallResource {
            id: Some("instance-7".into()),
            ..FirewallResource::default()
        };
        match res.parsed_id() {
            Err(CoreError::IdentifierParse { id: Some(id) }) => assert_eq!(id, "instance-7"),
            other => panic!("expected IdentifierParse, got {other:?}"),
        }
    }

    #[test]
    fn desired_firewall_validates_on_load() {
        let desired: DesiredFirewall = serde_json::from_value(json!({
            "instance_id": 42,
            "rules": [{ "services": ["amqp"], "ports": [5672], "ip": "10.0.0.0/24" }]
        }))
        .unwrap();

        assert_eq!(desired.instance_id, 42);
        let expected: RuleSet = vec![
            FirewallRule::new("10.0.0.0/24")
                .with_services([Service::Amqp])
                .with_ports([5672]),
        ]
        .into();
        assert_eq!(desired.rules, expected);
    }

    #[test]
    fn desired_firewall_rejects_bad_port() {
        let err = serde_json::from_value::<DesiredFirewall>(json!({
            "instance_id": 42,
            "rules": [{ "ports": [65555], "ip": "10.0.0.0/24" }]
        }))
        .unwrap_err();
        assert!(err.to_string().contains("65555"), "got: {err}");
    }

    #[test]
    fn resource_round_trips_through_json() {
        let res = FirewallResource {
            id: Some("7".into()),
            instance_id: 7,
            rules: vec![FirewallRule::new("0.0.0.0/0").with_description("all")].into(),
        };
        let text = serde_json::to_string(&res).unwrap();
        let back: FirewallResource = serde_json::from_str(&text).unwrap();
        assert_eq!(back, res);
    }

    #[test]
    fn matches_compares_as_sets() {
        let a = FirewallRule::new("10.0.0.0/8");
        let b = FirewallRule::new("192.168.0.0/16");
        let res = FirewallResource {
            id: Some("3".into()),
            instance_id: 3,
            rules: vec![a.clone(), b.clone()].into(),
        };
        assert!(res.matches(&DesiredFirewall::new(3, vec![b.clone(), a.clone()].into())));
        assert!(!res.matches(&DesiredFirewall::new(4, vec![a, b].into())));
    }
}
