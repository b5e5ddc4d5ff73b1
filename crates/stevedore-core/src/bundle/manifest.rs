//! Descriptor document generation for nest-mode bundles.
//!
//! Pure string substitution over three fixed-shape XML templates; no state
//! beyond the four inputs (proxy name, base path, virtual host, main script).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Virtual host the deployed proxy listens on. `Default` listens on HTTP;
/// use `Secure` for an HTTPS-only application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VirtualHost {
    #[default]
    Default,
    Secure,
}

impl VirtualHost {
    pub fn as_str(&self) -> &'static str {
        match self {
            VirtualHost::Default => "default",
            VirtualHost::Secure => "secure",
        }
    }
}

impl fmt::Display for VirtualHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VirtualHost {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "default" => Ok(VirtualHost::Default),
            "secure" => Ok(VirtualHost::Secure),
            other => Err(Error::Usage(format!(
                "invalid virtual host '{}': use 'default' or 'secure'",
                other
            ))),
        }
    }
}

/// Proxy manifest document. Emits the empty self-closing form when no
/// policies are supplied, and a present-but-still-empty container otherwise.
pub fn proxy_manifest(name: &str, policies: &[String]) -> String {
    if policies.is_empty() {
        format!("<APIProxy name=\"{}\"/>", name)
    } else {
        format!("<APIProxy name=\"{}\"></APIProxy>", name)
    }
}

/// Proxy endpoint document routing the configured base path and virtual
/// host to the default target.
pub fn proxy_endpoint(base_path: &str, virtual_host: VirtualHost) -> String {
    format!(
        "<ProxyEndpoint name=\"default\">\n  \
         <HTTPProxyConnection>\n    \
         <BasePath>{}</BasePath>\n    \
         <VirtualHost>{}</VirtualHost>\n  \
         </HTTPProxyConnection>\n  \
         <RouteRule name=\"default\">\n    \
         <TargetEndpoint>default</TargetEndpoint>\n  \
         </RouteRule>\n\
         </ProxyEndpoint>",
        base_path, virtual_host
    )
}

/// Target endpoint document pointing the script runtime at the main script.
pub fn target_endpoint(main_script: &str) -> String {
    format!(
        "<TargetEndpoint name=\"default\">\n  \
         <ScriptTarget>\n    \
         <ResourceURL>node://{}</ResourceURL>\n  \
         </ScriptTarget>\n\
         </TargetEndpoint>",
        main_script
    )
}

/// The three well-known descriptor entries added first to every nest-mode
/// bundle, in their fixed order.
pub fn descriptors(
    name: &str,
    base_path: &str,
    virtual_host: VirtualHost,
    main_script: &str,
) -> Vec<(String, String)> {
    vec![
        (
            format!("apiproxy/{}.xml", name),
            proxy_manifest(name, &[]),
        ),
        (
            "apiproxy/proxies/default.xml".to_string(),
            proxy_endpoint(base_path, virtual_host),
        ),
        (
            "apiproxy/targets/default.xml".to_string(),
            target_endpoint(main_script),
        ),
    ]
}
