//! HTTP adapter for the remote management endpoint.
//!
//! Wraps the management API's JSON surface behind the [`Gateway`] trait.
//! The client and credentials are constructed once and passed into every
//! call; no session state is shared across runs.

use anyhow::Context;
use serde::Deserialize;
use url::Url;

use super::{DeploymentRecord, Gateway};
use crate::config::Credentials;

/// Production gateway backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    http: reqwest::Client,
    base: Url,
    credentials: Credentials,
}

impl HttpGateway {
    /// Create a gateway client for the given management endpoint.
    pub fn new(base: Url, credentials: Credentials) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("stevedore/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base,
            credentials,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base.as_str().trim_end_matches('/'), path)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request.basic_auth(&self.credentials.username, Some(&self.credentials.password))
    }
}

impl Gateway for HttpGateway {
    async fn import_bundle(
        &self,
        organization: &str,
        name: &str,
        bundle: &[u8],
    ) -> anyhow::Result<i64> {
        let url = self.endpoint(&format!("v1/o/{}/apis", organization));
        tracing::debug!("Importing bundle ({} bytes) to {}", bundle.len(), url);

        let response = self
            .authorized(self.http.post(&url))
            .query(&[("action", "import"), ("name", name)])
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(bundle.to_vec())
            .send()
            .await
            .with_context(|| format!("Failed to reach management endpoint: {}", url))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Import rejected: HTTP {} - {}", status, body);
            return Ok(-1);
        }

        let body: serde_json::Value = response
            .json()
            .await
            .context("Failed to decode import response")?;
        parse_revision(&body).context("Import response missing a revision")
    }

    async fn deploy_without_conflict(
        &self,
        organization: &str,
        environment: &str,
        name: &str,
        base_path: &str,
        revision: i64,
    ) -> anyhow::Result<bool> {
        let url = self.endpoint(&format!(
            "v1/o/{}/e/{}/apis/{}/revisions/{}/deployments",
            organization, environment, name, revision
        ));
        tracing::debug!("Activating revision {} via {}", revision, url);

        let response = self
            .authorized(self.http.post(&url))
            .query(&[("override", "true"), ("basepath", base_path)])
            .send()
            .await
            .with_context(|| format!("Failed to reach management endpoint: {}", url))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Activation refused: HTTP {} - {}", status, body);
            return Ok(false);
        }

        Ok(true)
    }

    async fn list_deployments(
        &self,
        organization: &str,
        name: &str,
    ) -> anyhow::Result<Vec<DeploymentRecord>> {
        let url = self.endpoint(&format!("v1/o/{}/apis/{}/deployments", organization, name));

        let response = self
            .authorized(self.http.get(&url))
            .send()
            .await
            .with_context(|| format!("Failed to reach management endpoint: {}", url))?;

        if !response.status().is_success() {
            anyhow::bail!(
                "Failed to list deployments: HTTP {} from {}",
                response.status(),
                url
            );
        }

        let body: DeploymentsResponse = response
            .json()
            .await
            .context("Failed to decode deployments response")?;
        flatten_deployments(body)
    }
}

/// The management API reports revisions either as a bare number or as a
/// string; accept both.
fn parse_revision(body: &serde_json::Value) -> Option<i64> {
    let revision = body.get("revision")?;
    revision
        .as_i64()
        .or_else(|| revision.as_str().and_then(|s| s.parse().ok()))
}

#[derive(Debug, Deserialize)]
struct DeploymentsResponse {
    #[serde(default)]
    environment: Vec<EnvironmentDeployments>,
}

#[derive(Debug, Deserialize)]
struct EnvironmentDeployments {
    name: String,
    #[serde(default)]
    revision: Vec<RevisionDeployment>,
}

#[derive(Debug, Deserialize)]
struct RevisionDeployment {
    name: String,
    state: String,
}

/// Flatten the nested environment/revision response into the ordered record
/// list the orchestrator reports.
fn flatten_deployments(response: DeploymentsResponse) -> anyhow::Result<Vec<DeploymentRecord>> {
    let mut records = Vec::new();
    for environment in response.environment {
        for revision in environment.revision {
            let number: i64 = revision
                .name
                .parse()
                .with_context(|| format!("Non-numeric revision: {}", revision.name))?;
            records.push(DeploymentRecord {
                environment: environment.name.clone(),
                revision: number,
                state: revision.state,
            });
        }
    }
    Ok(records)
}
