use crate::config::schema::ExporterConfig;
use crate::error::{Error, Result};
use std::fs;
use std::path::Path;
use validator::Validate;

/// Values supplied on the command line. Each one that is set replaces the
/// value loaded from file (or the default).
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub ldap_uri: Option<String>,
    pub bind_dn: Option<String>,
    pub bind_pw: Option<String>,
    pub listen_address: Option<String>,
    pub telemetry_path: Option<String>,
    pub timeout_ms: Option<u64>,
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<ExporterConfig> {
        let config = Self::load_file(path.as_ref())?;
        config.validate()?;
        Ok(config)
    }

    /// Builds the effective configuration: defaults, then the optional file,
    /// then command-line overrides.
    pub fn resolve(path: Option<&Path>, overrides: ConfigOverrides) -> Result<ExporterConfig> {
        let base = match path {
            Some(path) => Self::load_file(path)?,
            None => ExporterConfig::default(),
        };

        let config = Self::apply_overrides(base, overrides);
        config.validate()?;
        Ok(config)
    }

    fn load_file(path: &Path) -> Result<ExporterConfig> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(serde_json::from_str(&content)?),
            Some("yaml") | Some("yml") => Ok(serde_yaml::from_str(&content)?),
            Some("toml") => Ok(toml::from_str(&content)?),
            _ => Err(Error::Config(format!(
                "Unsupported file extension: {}",
                path.display()
            ))),
        }
    }

    fn apply_overrides(mut config: ExporterConfig, overrides: ConfigOverrides) -> ExporterConfig {
        if let Some(uri) = overrides.ldap_uri {
            config.ldap_uri = uri;
        }
        if let Some(dn) = overrides.bind_dn {
            config.bind_dn = dn;
        }
        if let Some(pw) = overrides.bind_pw {
            config.bind_pw = pw;
        }
        if let Some(addr) = overrides.listen_address {
            config.listen_address = addr;
        }
        if let Some(path) = overrides.telemetry_path {
            config.telemetry_path = path;
        }
        if let Some(timeout) = overrides.timeout_ms {
            config.timeout_ms = timeout;
        }
        config
    }
}
