// ── Rule validation ──
//
// Pure, stateless checks on single fields and single rules. Nothing here
// looks across rules: overlapping or duplicate rules are left to the remote
// service.

use std::str::FromStr;

use strum::IntoEnumIterator;

use crate::error::ValidationError;
use crate::model::{FirewallRule, RuleSet, Service};

pub const PORT_MIN: i64 = 0;
/// Upper bound accepted for custom ports. Matches what the hosting API accepts.
pub const PORT_MAX: i64 = 65554;

/// Accept `name` iff it is one of the pre-defined services, ignoring case.
pub fn validate_service(name: &str) -> Result<Service, ValidationError> {
    Service::from_str(name).map_err(|_| ValidationError::InvalidServiceName {
        value: name.to_owned(),
        allowed: allowed_services(),
    })
}

/// Accept `port` iff it lies in `PORT_MIN..=PORT_MAX`.
pub fn validate_port(port: i64) -> Result<u32, ValidationError> {
    if (PORT_MIN..=PORT_MAX).contains(&port) {
        u32::try_from(port).map_err(|_| out_of_range(port))
    } else {
        Err(out_of_range(port))
    }
}

/// The source address is required. Its syntax is checked remotely.
pub fn validate_ip(ip: &str) -> Result<(), ValidationError> {
    if ip.trim().is_empty() {
        Err(ValidationError::MissingField { field: "ip" })
    } else {
        Ok(())
    }
}

/// Re-check a typed rule's ports and source address.
pub fn validate_rule(rule: &FirewallRule) -> Result<(), ValidationError> {
    for &port in &rule.ports {
        validate_port(i64::from(port))?;
    }
    validate_ip(&rule.ip)
}

/// Check every rule, reporting the position of the first bad one.
pub fn validate_rules(rules: &RuleSet) -> Result<(), ValidationError> {
    rules
        .iter()
        .enumerate()
        .try_for_each(|(index, rule)| validate_rule(rule).map_err(|e| e.in_rule(index)))
}

/// Build a typed rule from loosely-typed parts, validating each field.
pub(crate) fn rule_from_parts<S: AsRef<str>>(
    services: &[S],
    ports: &[i64],
    ip: &str,
    description: Option<&str>,
) -> Result<FirewallRule, ValidationError> {
    let services = services
        .iter()
        .map(|s| validate_service(s.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;
    let ports = ports
        .iter()
        .map(|&p| validate_port(p))
        .collect::<Result<Vec<_>, _>>()?;
    validate_ip(ip)?;

    let mut rule = FirewallRule::new(ip)
        .with_services(services)
        .with_ports(ports);
    rule.description = description.map(str::to_owned);
    Ok(rule)
}

fn out_of_range(value: i64) -> ValidationError {
    ValidationError::PortOutOfRange {
        value,
        min: PORT_MIN,
        max: PORT_MAX,
    }
}

fn allowed_services() -> String {
    Service::iter()
        .map(|s| s.as_ref().to_owned())
        .collect::<Vec<_>>()
        .join(", ")
}
