//! Deployment configuration: flag values merged with an optional JSON
//! configuration file into one validated structure.
//!
//! The core never re-inspects raw key/value pairs; the CLI hands it a
//! [`DeployConfig`] produced once by [`DeployConfig::resolve`]. File-supplied
//! values override command-line values for every field except the password,
//! which is never read from the file.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use url::Url;

use crate::bundle::manifest::VirtualHost;
use crate::error::Error;

/// Default management endpoint.
pub const DEFAULT_MANAGEMENT_URL: &str = "https://api.enterprise.apigee.com";

/// Which packaging/deployment flavor is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flavor {
    /// Flatten mode: a proxy configuration bundle preserving relative layout.
    Proxy,
    /// Nest mode: an application plus opaque dependency sub-archives.
    App,
}

/// Basic-auth credentials for the management endpoint, produced by the CLI
/// layer (flags or interactive prompts).
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Raw option values as collected from the command line, before the config
/// file merge and validation.
#[derive(Debug, Clone, Default)]
pub struct RawOptions {
    pub organization: Option<String>,
    pub environment: Option<String>,
    pub directory: Option<PathBuf>,
    pub name: Option<String>,
    pub main_script: Option<String>,
    pub username: Option<String>,
    pub base_path: Option<String>,
    pub management_url: Option<String>,
    pub zip_file: Option<PathBuf>,
    pub virtual_host: Option<String>,
    pub import_only: bool,
}

/// JSON configuration file. Every field is optional; present fields win
/// over command-line values. There is deliberately no password field.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub organization: Option<String>,
    #[serde(default)]
    pub environment: Option<String>,
    #[serde(default)]
    pub directory: Option<PathBuf>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub main_script: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub base_path: Option<String>,
    #[serde(default)]
    pub apigee_url: Option<String>,
    #[serde(default)]
    pub zip_file: Option<PathBuf>,
    #[serde(default)]
    pub virtual_host: Option<String>,
    #[serde(default)]
    pub import_only: Option<bool>,
}

impl ConfigFile {
    /// Load and parse a JSON configuration file.
    pub fn load(path: &Path) -> Result<Self, Error> {
        if !path.is_file() {
            return Err(Error::Config(format!(
                "the specified config file ({}) cannot be found",
                path.display()
            )));
        }
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!(
                "failed to read config file ({}): {}",
                path.display(),
                e
            ))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            Error::Config(format!(
                "the specified config file ({}) is not valid JSON: {}",
                path.display(),
                e
            ))
        })
    }
}

/// The resolved, validated configuration the core consumes.
#[derive(Debug, Clone)]
pub struct DeployConfig {
    pub flavor: Flavor,
    pub organization: String,
    pub environment: String,
    pub directory: PathBuf,
    pub name: String,
    /// Top-level script the application flavor boots from.
    pub main_script: Option<String>,
    pub base_path: String,
    pub virtual_host: VirtualHost,
    pub management_url: Url,
    pub zip_file: Option<PathBuf>,
    pub import_only: bool,
    /// Username after the merge; the CLI prompts when absent.
    pub username: Option<String>,
}

impl DeployConfig {
    /// Merge command-line values with an optional config file and validate.
    ///
    /// Missing required fields are collected and reported together in one
    /// usage error rather than one at a time.
    pub fn resolve(
        flavor: Flavor,
        mut raw: RawOptions,
        config_path: Option<&Path>,
    ) -> Result<Self, Error> {
        if let Some(path) = config_path {
            let file = ConfigFile::load(path)?;
            tracing::info!("Configuration file specified: {}", path.display());
            apply_file(&mut raw, file);
        }

        let mut missing = Vec::new();
        if raw.directory.is_none() {
            missing.push("-d/--directory");
        }
        if raw.environment.is_none() {
            missing.push("-e/--environment");
        }
        if raw.name.is_none() {
            missing.push("-n/--name");
        }
        if raw.organization.is_none() {
            missing.push("-o/--organization");
        }
        if flavor == Flavor::App && raw.main_script.is_none() {
            missing.push("-m/--main-script");
        }
        if !missing.is_empty() {
            return Err(Error::Usage(format!("{} required", missing.join(", "))));
        }

        let virtual_host = match raw.virtual_host.as_deref() {
            Some(s) => s.parse()?,
            None => VirtualHost::Default,
        };

        let url_text = raw
            .management_url
            .unwrap_or_else(|| DEFAULT_MANAGEMENT_URL.to_string());
        let management_url = Url::parse(&url_text)
            .map_err(|e| Error::Usage(format!("invalid management URL '{}': {}", url_text, e)))?;

        // The pushes above guarantee these are present.
        let (Some(organization), Some(environment), Some(directory), Some(name)) = (
            raw.organization,
            raw.environment,
            raw.directory,
            raw.name,
        ) else {
            return Err(Error::Usage("required fields missing".to_string()));
        };

        Ok(DeployConfig {
            flavor,
            organization,
            environment,
            directory,
            name,
            main_script: raw.main_script,
            base_path: raw.base_path.unwrap_or_else(|| "/".to_string()),
            virtual_host,
            management_url,
            zip_file: raw.zip_file,
            import_only: raw.import_only,
            username: raw.username,
        })
    }
}

/// Overlay file values on top of command-line values; the file wins for
/// every field it supplies.
fn apply_file(raw: &mut RawOptions, file: ConfigFile) {
    if file.organization.is_some() {
        raw.organization = file.organization;
    }
    if file.environment.is_some() {
        raw.environment = file.environment;
    }
    if file.directory.is_some() {
        raw.directory = file.directory;
    }
    if file.name.is_some() {
        raw.name = file.name;
    }
    if file.main_script.is_some() {
        raw.main_script = file.main_script;
    }
    if file.username.is_some() {
        raw.username = file.username;
    }
    if file.base_path.is_some() {
        raw.base_path = file.base_path;
    }
    if file.apigee_url.is_some() {
        raw.management_url = file.apigee_url;
    }
    if file.zip_file.is_some() {
        raw.zip_file = file.zip_file;
    }
    if file.virtual_host.is_some() {
        raw.virtual_host = file.virtual_host;
    }
    if let Some(import_only) = file.import_only {
        raw.import_only = import_only;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn complete_raw() -> RawOptions {
        RawOptions {
            organization: Some("acme".to_string()),
            environment: Some("test".to_string()),
            directory: Some(PathBuf::from("/srv/app")),
            name: Some("demo".to_string()),
            main_script: Some("server.js".to_string()),
            ..Default::default()
        }
    }

    fn write_config(json: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file
    }

    #[test]
    fn resolve_applies_defaults() {
        let config = DeployConfig::resolve(Flavor::App, complete_raw(), None).unwrap();

        assert_eq!(config.base_path, "/");
        assert_eq!(config.virtual_host, VirtualHost::Default);
        assert_eq!(config.management_url.as_str(), format!("{}/", DEFAULT_MANAGEMENT_URL));
        assert!(!config.import_only);
        assert!(config.zip_file.is_none());
    }

    #[test]
    fn file_values_override_command_line_values() {
        let file = write_config(
            r#"{
                "organization": "file-org",
                "environment": "prod",
                "base_path": "/v2",
                "virtual_host": "secure",
                "import_only": true
            }"#,
        );

        let mut raw = complete_raw();
        raw.base_path = Some("/v1".to_string());
        let config = DeployConfig::resolve(Flavor::App, raw, Some(file.path())).unwrap();

        assert_eq!(config.organization, "file-org");
        assert_eq!(config.environment, "prod");
        assert_eq!(config.base_path, "/v2");
        assert_eq!(config.virtual_host, VirtualHost::Secure);
        assert!(config.import_only);
        // Fields the file does not supply keep their command-line values.
        assert_eq!(config.name, "demo");
    }

    #[test]
    fn config_file_has_no_password_field() {
        // A password key in the file is ignored rather than merged.
        let file = write_config(r#"{"password": "hunter2", "organization": "acme"}"#);

        let parsed = ConfigFile::load(file.path()).unwrap();
        assert_eq!(parsed.organization.as_deref(), Some("acme"));

        let config = DeployConfig::resolve(Flavor::App, complete_raw(), Some(file.path())).unwrap();
        assert_eq!(config.organization, "acme");
    }

    #[test]
    fn missing_required_fields_are_reported_together() {
        let raw = RawOptions {
            main_script: Some("server.js".to_string()),
            ..Default::default()
        };
        let err = DeployConfig::resolve(Flavor::App, raw, None).unwrap_err();

        let message = err.to_string();
        assert!(message.contains("-d/--directory"));
        assert!(message.contains("-e/--environment"));
        assert!(message.contains("-n/--name"));
        assert!(message.contains("-o/--organization"));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn main_script_is_required_only_for_app_flavor() {
        let mut raw = complete_raw();
        raw.main_script = None;

        assert!(DeployConfig::resolve(Flavor::Proxy, raw.clone(), None).is_ok());
        let err = DeployConfig::resolve(Flavor::App, raw, None).unwrap_err();
        assert!(err.to_string().contains("-m/--main-script"));
    }

    #[test]
    fn missing_config_file_is_a_configuration_error() {
        let err =
            DeployConfig::resolve(Flavor::Proxy, complete_raw(), Some(Path::new("/no/such.json")))
                .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn invalid_json_is_a_configuration_error() {
        let file = write_config("{ not json }");
        let err = DeployConfig::resolve(Flavor::Proxy, complete_raw(), Some(file.path()))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn invalid_virtual_host_is_a_usage_error() {
        let mut raw = complete_raw();
        raw.virtual_host = Some("public".to_string());
        let err = DeployConfig::resolve(Flavor::App, raw, None).unwrap_err();
        assert!(matches!(err, Error::Usage(_)));
    }

    #[test]
    fn invalid_management_url_is_a_usage_error() {
        let mut raw = complete_raw();
        raw.management_url = Some("not a url".to_string());
        let err = DeployConfig::resolve(Flavor::App, raw, None).unwrap_err();
        assert!(matches!(err, Error::Usage(_)));
    }
}
