// ── Wire conversion: FirewallRule <-> RuleParams ──

use amqpfw_api::RuleParams;

use crate::error::ValidationError;
use crate::model::{FirewallRule, RuleSet};
use crate::validate;

impl From<&FirewallRule> for RuleParams {
    fn from(rule: &FirewallRule) -> Self {
        Self {
            services: rule.services.iter().map(ToString::to_string).collect(),
            ports: rule.ports.iter().map(|&p| i64::from(p)).collect(),
            ip: rule.ip.clone(),
            description: rule.description.clone(),
        }
    }
}

/// Remote rules are taken as the service reports them. Only values the
/// typed model cannot hold are refused: unknown service names and ports
/// outside `u32`.
impl TryFrom<&RuleParams> for FirewallRule {
    type Error = ValidationError;

    fn try_from(params: &RuleParams) -> Result<Self, Self::Error> {
        let services = params
            .services
            .iter()
            .map(|s| validate::validate_service(s))
            .collect::<Result<Vec<_>, _>>()?;
        let ports = params
            .ports
            .iter()
            .map(|&p| {
                u32::try_from(p).map_err(|_| ValidationError::PortOutOfRange {
                    value: p,
                    min: 0,
                    max: i64::from(u32::MAX),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut rule = FirewallRule::new(params.ip.clone())
            .with_services(services)
            .with_ports(ports);
        rule.description.clone_from(&params.description);
        Ok(rule)
    }
}

pub(crate) fn to_params(rules: &RuleSet) -> Vec<RuleParams> {
    rules.iter().map(RuleParams::from).collect()
}

pub(crate) fn from_params(params: &[RuleParams]) -> Result<RuleSet, ValidationError> {
    params
        .iter()
        .enumerate()
        .map(|(index, p)| FirewallRule::try_from(p).map_err(|e| e.in_rule(index)))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::Service;

    fn sample() -> FirewallRule {
        FirewallRule::new("10.56.72.0/24")
            .with_services([Service::Stomps, Service::Amqps])
            .with_ports([15674, 4567])
            .with_description("office")
    }

    #[test]
    fn outgoing_params_are_sorted_upper_case() {
        let params = RuleParams::from(&sample());
        assert_eq!(params.services, vec!["AMQPS", "STOMPS"]);
        assert_eq!(params.ports, vec![4567, 15674]);
        assert_eq!(params.ip, "10.56.72.0/24");
        assert_eq!(params.description.as_deref(), Some("office"));
    }

    #[test]
    fn translation_preserves_every_field() {
        let rule = sample();
        let back = FirewallRule::try_from(&RuleParams::from(&rule)).unwrap();
        assert_eq!(back, rule);

        let bare = FirewallRule::new("0.0.0.0/0");
        assert_eq!(FirewallRule::try_from(&RuleParams::from(&bare)).unwrap(), bare);
    }

    #[test]
    fn incoming_order_does_not_matter() {
        let params = RuleParams {
            services: vec!["stomps".into(), "AMQPS".into()],
            ports: vec![15674, 4567],
            ip: "10.56.72.0/24".into(),
            description: Some("office".into()),
        };
        assert_eq!(FirewallRule::try_from(&params).unwrap(), sample());
    }

    #[test]
    fn unknown_remote_service_is_rejected_with_position() {
        let params = vec![
            RuleParams::from(&sample()),
            RuleParams {
                services: vec!["HTTPS".into()],
                ports: vec![],
                ip: "0.0.0.0/0".into(),
                description: None,
            },
        ];
        let err = from_params(&params).unwrap_err();
        assert!(matches!(err, ValidationError::InRule { index: 1, .. }));
    }

    #[test]
    fn remote_values_outside_local_bounds_are_kept() {
        let params = RuleParams {
            services: vec!["AMQP".into()],
            ports: vec![65600],
            ip: String::new(),
            description: None,
        };
        let rule = FirewallRule::try_from(&params).unwrap();
        assert_eq!(
            rule,
            FirewallRule::new("")
                .with_services([Service::Amqp])
                .with_ports([65600])
        );
    }

    #[test]
    fn negative_remote_port_cannot_be_represented() {
        let params = RuleParams {
            services: vec![],
            ports: vec![-1],
            ip: "0.0.0.0/0".into(),
            description: None,
        };
        let err = FirewallRule::try_from(&params).unwrap_err();
        assert!(matches!(err, ValidationError::PortOutOfRange { value: -1, .. }));
    }

    #[test]
    fn to_params_keeps_duplicates() {
        let rules: RuleSet = vec![sample(), sample()].into();
        assert_eq!(to_params(&rules).len(), 2);
    }
}
