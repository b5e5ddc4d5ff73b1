//! Error taxonomy for the deployment workflow.
//!
//! Every failure surfaces immediately; there is no retry anywhere in the
//! core. The CLI maps each variant to a process exit code via
//! [`Error::exit_code`].

/// Top-level error type for bundle construction and deployment.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Missing, unreadable, or invalid configuration file.
    #[error("configuration error: {0}")]
    Config(String),

    /// A required field is absent after merging flags and config file.
    #[error("usage error: {0}")]
    Usage(String),

    /// The operator aborted an interactive credential prompt.
    #[error("credential prompt interrupted")]
    PromptInterrupted,

    /// The gateway rejected the bundle import (negative revision).
    #[error("bundle import rejected by the gateway (revision {revision})")]
    ImportRejected { revision: i64 },

    /// Activation returned failure; the revision was not deployed.
    #[error("activation conflict: revision {revision} was not deployed to '{environment}'")]
    ActivationConflict { revision: i64, environment: String },

    /// Filesystem failure while walking the source tree or persisting the
    /// bundle. Always raised before any remote call is made.
    #[error("packaging failed: {0:#}")]
    Packaging(anyhow::Error),

    /// A transport or decode fault while importing or activating; the
    /// workflow stops with nothing further attempted.
    #[error("remote gateway fault: {0:#}")]
    Gateway(anyhow::Error),

    /// A fault while listing deployments for the final report. The import
    /// (and activation, when requested) already succeeded.
    #[error("failed to retrieve the deployment report: {0:#}")]
    Reporting(anyhow::Error),
}

impl Error {
    /// Process exit code for this error.
    ///
    /// Import and activation failures exit 2; everything else exits 1.
    /// Success paths exit 0 from the CLI after printing the report.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::ImportRejected { .. } | Error::ActivationConflict { .. } => 2,
            _ => 1,
        }
    }
}
