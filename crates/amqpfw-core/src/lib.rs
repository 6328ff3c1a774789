//! Firewall reconciliation for managed message-broker instances.
//!
//! This crate owns the rule model and the lifecycle logic that sits between a
//! declarative rule collection and the remote firewall API:
//!
//! - **Rule model** ([`model`]): [`FirewallRule`], the unordered [`RuleSet`]
//!   with multiset equality, and the reconciled [`FirewallResource`].
//!
//! - **Validator** ([`validate`]): pure per-field checks (service names,
//!   port bounds, required `ip`) run before anything is sent.
//!
//! - **[`FirewallController`]**: Create / Read / Update / Delete / Import over
//!   any [`amqpfw_api::FirewallApi`]. Every write replaces the whole remote rule
//!   list and is followed by a Read, so local state always reflects the
//!   service's answer.

pub mod controller;
pub mod convert;
pub mod error;
pub mod model;
pub mod validate;

// ── Primary re-exports ──────────────────────────────────────────────
pub use controller::FirewallController;
pub use error::{CoreError, ValidationError};
pub use model::{
    DesiredFirewall, FirewallResource, FirewallRule, RuleInput, RuleSet, RulesFile, Service,
};
