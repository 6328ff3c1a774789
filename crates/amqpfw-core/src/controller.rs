// ── Resource controller ──
//
// Lifecycle of one firewall resource against a `FirewallApi`.
//
//   Absent ──create──▶ Present ──read/update──▶ Present ──delete──▶ Absent
//   Absent ──import──▶ Present
//
// Every write sends the complete rule list and is followed by a Read, so the
// resource always holds what the service reports. Nothing is retried here;
// wrap the API in `amqpfw_api::Retrying` for that.

use amqpfw_api::FirewallApi;
use tracing::{debug, info};

use crate::convert;
use crate::error::CoreError;
use crate::model::resource::parse_instance_id;
use crate::model::{DesiredFirewall, FirewallResource, RuleSet};
use crate::validate;

/// Drives Create / Read / Update / Delete / Import for firewall resources.
///
/// Holds no state besides the API handle; resources are owned by the caller.
#[derive(Debug, Clone)]
pub struct FirewallController<A> {
    api: A,
}

impl<A: FirewallApi + Sync> FirewallController<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Install `desired` on a new resource and hydrate it from the service.
    ///
    /// On validation or remote failure `resource` is left untouched. If the
    /// follow-up Read fails the resource is already Present and the read
    /// error is returned.
    pub async fn create(
        &self,
        resource: &mut FirewallResource,
        desired: &DesiredFirewall,
    ) -> Result<(), CoreError> {
        let instance_id = desired.instance_id;
        let resource_id = instance_id.to_string();
        debug!(
            instance_id,
            rule_count = desired.rules.len(),
            "creating firewall settings"
        );

        validate::validate_rules(&desired.rules)?;
        let params = convert::to_params(&desired.rules);

        self.api
            .create_firewall_settings(instance_id, &params)
            .await
            .map_err(|source| CoreError::RemoteOperation {
                operation: "create",
                resource_id: resource_id.clone(),
                source,
            })?;

        info!(instance_id, "firewall settings created");
        resource.id = Some(resource_id);
        self.read(resource).await
    }

    /// Refresh `resource` from the service.
    ///
    /// `instance_id` and `rules` are replaced together, and only when the
    /// whole remote rule list converts cleanly.
    pub async fn read(&self, resource: &mut FirewallResource) -> Result<(), CoreError> {
        let instance_id = resource.parsed_id()?;
        debug!(instance_id, resource_id = ?resource.id, "reading firewall settings");

        let params = self.api.read_firewall_settings(instance_id).await?;
        let rules: RuleSet =
            convert::from_params(&params).map_err(|source| CoreError::InvalidRemoteRules {
                resource_id: instance_id.to_string(),
                source,
            })?;

        debug!(instance_id, rule_count = rules.len(), "firewall settings read");
        resource.instance_id = instance_id;
        resource.rules = rules;
        Ok(())
    }

    /// Replace the remote rule list with `desired` and resynchronise.
    pub async fn update(
        &self,
        resource: &mut FirewallResource,
        desired: &DesiredFirewall,
    ) -> Result<(), CoreError> {
        let current = resource.parsed_id()?;
        let instance_id = desired.instance_id;
        debug!(
            instance_id,
            resource_id = current,
            rule_count = desired.rules.len(),
            "updating firewall settings"
        );

        validate::validate_rules(&desired.rules)?;
        let params = convert::to_params(&desired.rules);

        self.api
            .update_firewall_settings(instance_id, &params)
            .await
            .map_err(|source| CoreError::RemoteOperation {
                operation: "update",
                resource_id: current.to_string(),
                source,
            })?;

        info!(instance_id, "firewall settings updated");
        resource.id = Some(instance_id.to_string());
        self.read(resource).await
    }

    /// Remove the remote configuration. The API result is returned as is;
    /// the caller discards the resource on success.
    ///
    /// The identifier and `instance_id` must name the same instance.
    pub async fn delete(&self, resource: &FirewallResource) -> Result<(), CoreError> {
        let instance_id = resource.parsed_id()?;
        if instance_id != resource.instance_id {
            return Err(CoreError::IdentifierMismatch {
                id: instance_id.to_string(),
                instance_id: resource.instance_id,
            });
        }
        debug!(instance_id, resource_id = ?resource.id, "deleting firewall settings");

        self.api.delete_firewall_settings(instance_id).await?;

        info!(instance_id, "firewall settings deleted");
        Ok(())
    }

    /// Adopt an existing configuration by identifier. Never calls create.
    pub async fn import(&self, id: &str) -> Result<FirewallResource, CoreError> {
        let instance_id = parse_instance_id(id)?;
        debug!(instance_id, "importing firewall settings");

        let mut resource = FirewallResource {
            id: Some(instance_id.to_string()),
            instance_id,
            rules: RuleSet::new(),
        };
        self.read(&mut resource).await?;

        info!(
            instance_id,
            rule_count = resource.rules.len(),
            "firewall settings imported"
        );
        Ok(resource)
    }
}
