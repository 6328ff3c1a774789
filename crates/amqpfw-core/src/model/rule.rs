// ── Firewall rule types ──

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// Pre-defined broker protocols a rule can open.
///
/// Parsing is case-insensitive (`"amqps"` → `Amqps`); display and
/// serialization use the upper-case wire names.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum Service {
    Amqp,
    Amqps,
    Mqtt,
    Mqtts,
    Stomp,
    Stomps,
}

/// One validated access rule: protocols + custom ports + source network.
///
/// Both collections are sets, so two rules listing the same services or
/// ports in a different order are the same rule.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FirewallRule {
    #[serde(default)]
    pub services: BTreeSet<Service>,
    #[serde(default)]
    pub ports: BTreeSet<u32>,
    /// Source address with netmask, e.g. `10.0.0.0/24`.
    pub ip: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FirewallRule {
    /// A rule for `ip` with no services or ports.
    pub fn new(ip: impl Into<String>) -> Self {
        Self {
            services: BTreeSet::new(),
            ports: BTreeSet::new(),
            ip: ip.into(),
            description: None,
        }
    }

    pub fn with_services(mut self, services: impl IntoIterator<Item = Service>) -> Self {
        self.services.extend(services);
        self
    }

    pub fn with_ports(mut self, ports: impl IntoIterator<Item = u32>) -> Self {
        self.ports.extend(ports);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A rule as written by the user, before validation.
///
/// Service names are free-form strings and ports are plain integers
/// so that bad input reaches the validator instead of failing in serde.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleInput {
    #[serde(default)]
    pub services: Vec<String>,
    #[serde(default)]
    pub ports: Vec<i64>,
    pub ip: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use serde_json::json;
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn service_parses_any_case() {
        assert_eq!(Service::from_str("amqps").unwrap(), Service::Amqps);
        assert_eq!(Service::from_str("MqTt").unwrap(), Service::Mqtt);
        assert!(Service::from_str("HTTP").is_err());
    }

    #[test]
    fn service_displays_upper_case() {
        let names: Vec<String> = Service::iter().map(|s| s.to_string()).collect();
        assert_eq!(names, ["AMQP", "AMQPS", "MQTT", "MQTTS", "STOMP", "STOMPS"]);
    }

    #[test]
    fn rule_serializes_sets_in_order() {
        let rule = FirewallRule::new("10.0.0.0/24")
            .with_services([Service::Stomp, Service::Amqp])
            .with_ports([15672, 5672]);
        assert_eq!(
            serde_json::to_value(&rule).unwrap(),
            json!({ "services": ["AMQP", "STOMP"], "ports": [5672, 15672], "ip": "10.0.0.0/24" })
        );
    }

    #[test]
    fn rule_equality_ignores_listing_order() {
        let a = FirewallRule::new("10.0.0.0/24").with_ports([1, 2, 3]);
        let b = FirewallRule::new("10.0.0.0/24").with_ports([3, 1, 2]);
        assert_eq!(a, b);
    }

    #[test]
    fn rule_input_rejects_unknown_fields() {
        let err = serde_json::from_value::<RuleInput>(json!({ "ip": "1.2.3.4/32", "port": 1 }));
        assert!(err.is_err());
    }
}
