// Firewall settings endpoints
//
// The service keeps one firewall configuration per instance and every
// write replaces the whole rule list. There is no per-rule endpoint.

use std::future::Future;

use tracing::trace;

use crate::client::ApiClient;
use crate::error::Error;
use crate::types::RuleParams;

/// The four operations the reconciler needs from the remote service.
///
/// Keyed by the integer instance id. Implemented by [`ApiClient`] for the
/// real service, by [`Retrying`](crate::Retrying) as a decorator, and by
/// in-memory fakes in tests.
pub trait FirewallApi {
    /// Install a rule list on an instance.
    fn create_firewall_settings(
        &self,
        instance_id: i64,
        rules: &[RuleParams],
    ) -> impl Future<Output = Result<(), Error>> + Send;

    /// Fetch the active rule list of an instance.
    fn read_firewall_settings(
        &self,
        instance_id: i64,
    ) -> impl Future<Output = Result<Vec<RuleParams>, Error>> + Send;

    /// Replace the active rule list of an instance.
    fn update_firewall_settings(
        &self,
        instance_id: i64,
        rules: &[RuleParams],
    ) -> impl Future<Output = Result<(), Error>> + Send;

    /// Remove the firewall configuration of an instance.
    fn delete_firewall_settings(
        &self,
        instance_id: i64,
    ) -> impl Future<Output = Result<(), Error>> + Send;
}

fn firewall_path(instance_id: i64) -> String {
    format!("api/instances/{instance_id}/security/firewall")
}

impl FirewallApi for ApiClient {
    async fn create_firewall_settings(
        &self,
        instance_id: i64,
        rules: &[RuleParams],
    ) -> Result<(), Error> {
        trace!(instance_id, ?rules, "create firewall payload");
        self.post(&firewall_path(instance_id), rules).await
    }

    async fn read_firewall_settings(&self, instance_id: i64) -> Result<Vec<RuleParams>, Error> {
        let rules: Vec<RuleParams> = self.get(&firewall_path(instance_id)).await?;
        trace!(instance_id, ?rules, "read firewall payload");
        Ok(rules)
    }

    async fn update_firewall_settings(
        &self,
        instance_id: i64,
        rules: &[RuleParams],
    ) -> Result<(), Error> {
        trace!(instance_id, ?rules, "update firewall payload");
        self.put(&firewall_path(instance_id), rules).await
    }

    async fn delete_firewall_settings(&self, instance_id: i64) -> Result<(), Error> {
        self.delete(&firewall_path(instance_id)).await
    }
}
