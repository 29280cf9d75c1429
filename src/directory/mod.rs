//! Read-only access to the directory server.
//!
//! Probes talk to a [`Directory`] rather than to `ldap3` directly, so a scrape
//! can be driven against any backend that answers the three fixed queries.

pub mod ldap;

use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;

pub use ldap::{LdapConnector, LdapSession};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchScope {
    Base,
    Subtree,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub base: String,
    pub scope: SearchScope,
    pub filter: String,
    pub attributes: Vec<String>,
}

impl SearchRequest {
    pub fn new(base: &str, scope: SearchScope, filter: &str, attributes: &[&str]) -> Self {
        Self {
            base: base.to_string(),
            scope,
            filter: filter.to_string(),
            attributes: attributes.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// The root DSE: empty base, base scope, every user attribute.
    pub fn root_dse() -> Self {
        Self::new("", SearchScope::Base, "(objectClass=*)", &["*"])
    }

    pub fn monitor() -> Self {
        Self::new("cn=monitor", SearchScope::Base, "(objectClass=*)", &["*"])
    }

    /// All replication agreements, with the `ibm-repl*` operational attributes.
    pub fn replication_agreements() -> Self {
        Self::new(
            "",
            SearchScope::Subtree,
            "(objectClass=ibm-replicationAgreement)",
            &["cn", "++ibmrepl"],
        )
    }
}

/// One entry returned by a search. Attribute names are matched
/// case-insensitively, as LDAP does.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DirectoryEntry {
    pub dn: String,
    attributes: HashMap<String, Vec<String>>,
}

impl DirectoryEntry {
    pub fn new(dn: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            attributes: HashMap::new(),
        }
    }

    pub fn from_attributes(dn: impl Into<String>, attributes: HashMap<String, Vec<String>>) -> Self {
        attributes
            .into_iter()
            .fold(Self::new(dn), |entry, (name, values)| entry.with_values(&name, values))
    }

    pub fn with_attribute(self, name: &str, value: impl Into<String>) -> Self {
        self.with_values(name, vec![value.into()])
    }

    pub fn with_values(mut self, name: &str, values: Vec<String>) -> Self {
        self.attributes
            .entry(name.to_ascii_lowercase())
            .or_default()
            .extend(values);
        self
    }

    /// First value of `name`, or the empty string when the attribute is absent.
    pub fn first(&self, name: &str) -> &str {
        self.values(name).first().map(String::as_str).unwrap_or("")
    }

    pub fn values(&self, name: &str) -> &[String] {
        self.attributes
            .get(&name.to_ascii_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// An open session against the directory server.
#[async_trait]
pub trait Directory: Send {
    async fn search(&mut self, request: &SearchRequest) -> Result<Vec<DirectoryEntry>>;

    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Opens a fresh [`Directory`] session for each scrape.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn Directory>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_lookup_ignores_case() {
        let entry = DirectoryEntry::new("cn=monitor").with_attribute("currentConnections", "12");
        assert_eq!(entry.first("currentconnections"), "12");
        assert_eq!(entry.first("CURRENTCONNECTIONS"), "12");
    }

    #[test]
    fn missing_attribute_is_empty() {
        let entry = DirectoryEntry::new("");
        assert_eq!(entry.first("vendorname"), "");
        assert!(entry.values("ibm-replicationperformance").is_empty());
    }

    #[test]
    fn repeated_attribute_keeps_all_values_in_order() {
        let entry = DirectoryEntry::new("cn=agreement")
            .with_attribute("ibm-replicationPerformance", "[c=0]")
            .with_attribute("ibm-replicationperformance", "[c=1]");
        assert_eq!(entry.values("ibm-replicationperformance"), ["[c=0]", "[c=1]"]);
    }

    #[test]
    fn fixed_queries() {
        let root = SearchRequest::root_dse();
        assert_eq!(root.base, "");
        assert_eq!(root.scope, SearchScope::Base);

        let repl = SearchRequest::replication_agreements();
        assert_eq!(repl.scope, SearchScope::Subtree);
        assert_eq!(repl.filter, "(objectClass=ibm-replicationAgreement)");
        assert_eq!(repl.attributes, vec!["cn", "++ibmrepl"]);
    }
}
