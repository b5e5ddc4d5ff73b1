//! Deployment orchestration: a single forward path with no cycles.
//!
//! `BUILT -> (persisted locally) -> IMPORTED -> (activated) -> REPORTED`
//!
//! Local persistence is an optional side effect before import and does not
//! gate the remote workflow. A rejected import or refused activation is
//! terminal; the report step always runs after a successful import unless
//! activation aborted the run.

use std::path::PathBuf;

use crate::bundle::Bundle;
use crate::config::DeployConfig;
use crate::error::Error;
use crate::gateway::{DeploymentRecord, Gateway};

/// The remote-workflow inputs, derived from the resolved configuration.
#[derive(Debug, Clone)]
pub struct DeployPlan {
    pub organization: String,
    pub environment: String,
    pub name: String,
    pub base_path: String,
    pub import_only: bool,
    pub output_zip: Option<PathBuf>,
}

impl DeployPlan {
    pub fn from_config(config: &DeployConfig) -> Self {
        Self {
            organization: config.organization.clone(),
            environment: config.environment.clone(),
            name: config.name.clone(),
            base_path: config.base_path.clone(),
            import_only: config.import_only,
            output_zip: config.zip_file.clone(),
        }
    }
}

/// Outcome of a completed workflow run.
#[derive(Debug, Clone)]
pub struct DeployReport {
    /// Revision the gateway assigned on import.
    pub revision: i64,
    /// Whether the activation step ran and succeeded.
    pub activated: bool,
    /// Current deployments as reported by the gateway.
    pub deployments: Vec<DeploymentRecord>,
}

/// Sequences the import / activate / report workflow against a gateway.
#[derive(Debug)]
pub struct DeploymentOrchestrator<G> {
    gateway: G,
}

impl<G: Gateway> DeploymentOrchestrator<G> {
    pub fn new(gateway: G) -> Self {
        Self { gateway }
    }

    /// Run the workflow to completion or to the first terminal failure.
    pub async fn run(&self, bundle: &Bundle, plan: &DeployPlan) -> Result<DeployReport, Error> {
        let bytes = bundle.to_zip_bytes().map_err(Error::Packaging)?;

        if let Some(path) = &plan.output_zip {
            bundle.write_to(path).map_err(Error::Packaging)?;
            tracing::info!("Wrote bundle archive to {}", path.display());
        }

        let revision = self
            .gateway
            .import_bundle(&plan.organization, &plan.name, &bytes)
            .await
            .map_err(Error::Gateway)?;
        if revision < 0 {
            return Err(Error::ImportRejected { revision });
        }
        tracing::info!("Imported new revision {}", revision);

        let mut activated = false;
        if !plan.import_only {
            let accepted = self
                .gateway
                .deploy_without_conflict(
                    &plan.organization,
                    &plan.environment,
                    &plan.name,
                    &plan.base_path,
                    revision,
                )
                .await
                .map_err(Error::Gateway)?;
            if !accepted {
                return Err(Error::ActivationConflict {
                    revision,
                    environment: plan.environment.clone(),
                });
            }
            tracing::info!("Activated revision {} in '{}'", revision, plan.environment);
            activated = true;
        }

        let deployments = self
            .gateway
            .list_deployments(&plan.organization, &plan.name)
            .await
            .map_err(Error::Reporting)?;

        Ok(DeployReport {
            revision,
            activated,
            deployments,
        })
    }
}

/// Human-readable deployment table.
pub fn render_report(report: &DeployReport) -> String {
    let mut out = String::new();
    if report.deployments.is_empty() {
        out.push_str("No active deployments.\n");
        return out;
    }

    out.push_str(&format!("{:<16} {:<10} State\n", "Environment", "Revision"));
    for record in &report.deployments {
        out.push_str(&format!(
            "{:<16} {:<10} {}\n",
            record.environment, record.revision, record.state
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Scripted gateway that records the order of calls.
    struct MockGateway {
        import_result: i64,
        deploy_result: bool,
        list_fails: bool,
        deployments: Vec<DeploymentRecord>,
        calls: Mutex<Vec<String>>,
    }

    impl MockGateway {
        fn new(import_result: i64, deploy_result: bool) -> Self {
            Self {
                import_result,
                deploy_result,
                list_fails: false,
                deployments: vec![DeploymentRecord {
                    environment: "test".to_string(),
                    revision: 7,
                    state: "deployed".to_string(),
                }],
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl Gateway for MockGateway {
        async fn import_bundle(
            &self,
            _organization: &str,
            _name: &str,
            _bundle: &[u8],
        ) -> anyhow::Result<i64> {
            self.calls.lock().unwrap().push("import".to_string());
            Ok(self.import_result)
        }

        async fn deploy_without_conflict(
            &self,
            _organization: &str,
            _environment: &str,
            _name: &str,
            _base_path: &str,
            _revision: i64,
        ) -> anyhow::Result<bool> {
            self.calls.lock().unwrap().push("deploy".to_string());
            Ok(self.deploy_result)
        }

        async fn list_deployments(
            &self,
            _organization: &str,
            _name: &str,
        ) -> anyhow::Result<Vec<DeploymentRecord>> {
            self.calls.lock().unwrap().push("list".to_string());
            if self.list_fails {
                anyhow::bail!("connection reset by peer");
            }
            Ok(self.deployments.clone())
        }
    }

    fn sample_bundle() -> Bundle {
        let mut bundle = Bundle::new();
        bundle.add_entry("a.js", b"a".to_vec()).unwrap();
        bundle
    }

    fn plan(import_only: bool) -> DeployPlan {
        DeployPlan {
            organization: "acme".to_string(),
            environment: "test".to_string(),
            name: "demo".to_string(),
            base_path: "/".to_string(),
            import_only,
            output_zip: None,
        }
    }

    #[tokio::test]
    async fn successful_run_imports_activates_and_reports() {
        let orchestrator = DeploymentOrchestrator::new(MockGateway::new(7, true));

        let report = orchestrator.run(&sample_bundle(), &plan(false)).await.unwrap();

        assert_eq!(report.revision, 7);
        assert!(report.activated);
        assert_eq!(report.deployments.len(), 1);
        assert_eq!(orchestrator.gateway.calls(), vec!["import", "deploy", "list"]);
    }

    #[tokio::test]
    async fn rejected_import_is_terminal() {
        let orchestrator = DeploymentOrchestrator::new(MockGateway::new(-1, true));

        let err = orchestrator
            .run(&sample_bundle(), &plan(false))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::ImportRejected { revision: -1 }));
        assert_eq!(err.exit_code(), 2);
        // No activation and no report after a rejected import.
        assert_eq!(orchestrator.gateway.calls(), vec!["import"]);
    }

    #[tokio::test]
    async fn import_only_skips_activation_but_still_reports() {
        let orchestrator = DeploymentOrchestrator::new(MockGateway::new(3, false));

        let report = orchestrator.run(&sample_bundle(), &plan(true)).await.unwrap();

        assert_eq!(report.revision, 3);
        assert!(!report.activated);
        assert_eq!(orchestrator.gateway.calls(), vec!["import", "list"]);
    }

    #[tokio::test]
    async fn refused_activation_is_terminal_and_skips_report() {
        let orchestrator = DeploymentOrchestrator::new(MockGateway::new(4, false));

        let err = orchestrator
            .run(&sample_bundle(), &plan(false))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::ActivationConflict { revision: 4, .. }));
        assert_eq!(err.exit_code(), 2);
        assert_eq!(orchestrator.gateway.calls(), vec!["import", "deploy"]);
    }

    #[tokio::test]
    async fn fault_while_listing_deployments_propagates_after_activation() {
        let mut gateway = MockGateway::new(7, true);
        gateway.list_fails = true;
        let orchestrator = DeploymentOrchestrator::new(gateway);

        let err = orchestrator
            .run(&sample_bundle(), &plan(false))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Reporting(_)));
        assert_eq!(err.exit_code(), 1);
        // Import and activation already happened; only the report failed.
        assert_eq!(orchestrator.gateway.calls(), vec!["import", "deploy", "list"]);
    }

    #[tokio::test]
    async fn persistence_happens_before_import_and_does_not_gate_it() {
        let temp = tempfile::TempDir::new().unwrap();
        let out = temp.path().join("bundle.zip");
        std::fs::write(&out, b"stale").unwrap();

        let mut plan = plan(false);
        plan.output_zip = Some(out.clone());

        // Import is rejected, yet the archive was already persisted.
        let orchestrator = DeploymentOrchestrator::new(MockGateway::new(-1, true));
        let err = orchestrator
            .run(&sample_bundle(), &plan)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::ImportRejected { .. }));
        let written = std::fs::read(&out).unwrap();
        assert_ne!(written, b"stale");
    }

    #[test]
    fn report_renders_one_line_per_record() {
        let report = DeployReport {
            revision: 7,
            activated: true,
            deployments: vec![
                DeploymentRecord {
                    environment: "test".to_string(),
                    revision: 7,
                    state: "deployed".to_string(),
                },
                DeploymentRecord {
                    environment: "prod".to_string(),
                    revision: 5,
                    state: "deployed".to_string(),
                },
            ],
        };

        let rendered = render_report(&report);
        assert!(rendered.contains("Environment"));
        assert!(rendered.contains("test"));
        assert!(rendered.contains("prod"));
        assert_eq!(rendered.lines().count(), 3);
    }

    #[test]
    fn empty_report_renders_placeholder() {
        let report = DeployReport {
            revision: 1,
            activated: false,
            deployments: Vec::new(),
        };
        assert_eq!(render_report(&report), "No active deployments.\n");
    }
}
