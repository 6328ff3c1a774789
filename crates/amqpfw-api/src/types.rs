// Wire types for the firewall endpoints.

use serde::{Deserialize, Serialize};

/// One firewall rule as the API sends and receives it.
///
/// The endpoint takes and returns a JSON array of these. `services` holds
/// upper-case protocol names (`"AMQP"`, `"MQTTS"`, ...), `ports` holds custom
/// port numbers. Either may be absent in a response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleParams {
    #[serde(default)]
    pub services: Vec<String>,
    #[serde(default)]
    pub ports: Vec<i64>,
    pub ip: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn missing_lists_default_to_empty() {
        let rule: RuleParams = serde_json::from_value(json!({ "ip": "0.0.0.0/0" })).unwrap();
        assert!(rule.services.is_empty());
        assert!(rule.ports.is_empty());
        assert_eq!(rule.description, None);
    }

    #[test]
    fn description_is_omitted_when_absent() {
        let rule = RuleParams {
            services: vec!["AMQPS".into()],
            ports: vec![4567],
            ip: "10.0.0.0/24".into(),
            description: None,
        };
        let value = serde_json::to_value(&rule).unwrap();
        assert_eq!(
            value,
            json!({ "services": ["AMQPS"], "ports": [4567], "ip": "10.0.0.0/24" })
        );
    }
}
