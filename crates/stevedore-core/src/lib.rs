//! Stevedore Core Library
//!
//! Provides the domain logic for packaging local proxy and application
//! directories into gateway bundles and driving the import / activate /
//! report workflow against a remote management endpoint.

pub mod bundle;
pub mod config;
pub mod deploy;
pub mod error;
pub mod gateway;

/// Re-exports of commonly used types
pub mod prelude {
    // Bundle construction
    pub use crate::bundle::builder::{build_flat, build_nested};
    pub use crate::bundle::manifest::{VirtualHost, descriptors};
    pub use crate::bundle::{Bundle, RESOURCE_PREFIX};

    // Configuration
    pub use crate::config::{Credentials, DeployConfig, Flavor, RawOptions};

    // Deployment workflow
    pub use crate::deploy::{DeployPlan, DeployReport, DeploymentOrchestrator, render_report};

    // Gateway
    pub use crate::gateway::http::HttpGateway;
    pub use crate::gateway::{DeploymentRecord, Gateway};

    // Errors
    pub use crate::error::Error;
}
