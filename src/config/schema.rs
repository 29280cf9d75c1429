use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ExporterConfig {
    /// URI of the LDAP server; only the scheme, host and port are used
    #[serde(default = "default_ldap_uri")]
    #[validate(custom = "validate_ldap_uri")]
    pub ldap_uri: String,

    #[serde(default = "default_bind_dn")]
    pub bind_dn: String,

    /// An empty password leaves the session anonymous
    #[serde(default)]
    pub bind_pw: String,

    #[serde(default = "default_listen_address")]
    #[validate(length(min = 1))]
    pub listen_address: String,

    #[serde(default = "default_telemetry_path")]
    #[validate(custom = "validate_telemetry_path")]
    pub telemetry_path: String,

    /// Dial and per-query timeout
    #[serde(default = "default_timeout_ms")]
    #[validate(range(min = 1))]
    pub timeout_ms: u64,
}

impl ExporterConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            ldap_uri: default_ldap_uri(),
            bind_dn: default_bind_dn(),
            bind_pw: String::new(),
            listen_address: default_listen_address(),
            telemetry_path: default_telemetry_path(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

fn validate_ldap_uri(uri: &str) -> Result<(), ValidationError> {
    let url = Url::parse(uri).map_err(|_| ValidationError::new("invalid_ldap_uri"))?;
    match url.scheme() {
        "ldap" | "ldaps" | "ldapi" => Ok(()),
        _ => Err(ValidationError::new("unsupported_ldap_scheme")),
    }
}

fn validate_telemetry_path(path: &str) -> Result<(), ValidationError> {
    if path.starts_with('/') && path.len() > 1 {
        Ok(())
    } else {
        Err(ValidationError::new("telemetry_path_must_be_absolute"))
    }
}

fn default_ldap_uri() -> String {
    "ldap://localhost:389".to_string()
}

fn default_bind_dn() -> String {
    "cn=root".to_string()
}

fn default_listen_address() -> String {
    "0.0.0.0:9981".to_string()
}

fn default_telemetry_path() -> String {
    "/metrics".to_string()
}

fn default_timeout_ms() -> u64 {
    1000
}
