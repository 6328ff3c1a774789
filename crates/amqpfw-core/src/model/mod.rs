// ── Domain model ──
//
// Canonical types for firewall rules and the reconciled resource.
// Wire types live in `amqpfw_api::types`; `crate::convert` maps between them.

pub mod resource;
pub mod rule;
pub mod rule_set;

pub use resource::{DesiredFirewall, FirewallResource, RulesFile};
pub use rule::{FirewallRule, RuleInput, Service};
pub use rule_set::RuleSet;
