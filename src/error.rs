use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("LDAP error: {0}")]
    Ldap(#[from] ldap3::LdapError),

    #[error("Search under '{base}' returned no entries")]
    EmptyResult { base: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Encoding error: {0}")]
    Encode(#[from] std::fmt::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;
