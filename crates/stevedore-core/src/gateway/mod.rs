//! Remote gateway contract consumed by the deployment orchestrator.
//!
//! The management endpoint is a black box behind the [`Gateway`] trait:
//! import a bundle, activate a revision without conflict, list deployments.
//! [`http::HttpGateway`] is the production adapter; tests substitute a
//! scripted implementation.

pub mod http;

use serde::{Deserialize, Serialize};

/// One deployment of a proxy revision as reported by the gateway.
/// Read-only from the orchestrator's perspective.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentRecord {
    pub environment: String,
    pub revision: i64,
    pub state: String,
}

/// The three management operations the orchestrator sequences.
///
/// Failure signals are part of the data, not the `Err` channel: an import
/// rejection is a negative revision and an activation conflict is `false`.
/// `Err` is reserved for transport and decode faults, which propagate.
#[allow(async_fn_in_trait)]
pub trait Gateway {
    /// Upload bundle bytes as a new revision of `name`. A returned value
    /// below zero signals that the gateway rejected the import.
    async fn import_bundle(
        &self,
        organization: &str,
        name: &str,
        bundle: &[u8],
    ) -> anyhow::Result<i64>;

    /// Activate `revision` in `environment`, displacing any conflicting
    /// deployment on the same base path. `false` signals the activation
    /// was refused.
    async fn deploy_without_conflict(
        &self,
        organization: &str,
        environment: &str,
        name: &str,
        base_path: &str,
        revision: i64,
    ) -> anyhow::Result<bool>;

    /// Current deployments of `name` across all environments, in the order
    /// the gateway reports them.
    async fn list_deployments(
        &self,
        organization: &str,
        name: &str,
    ) -> anyhow::Result<Vec<DeploymentRecord>>;
}
