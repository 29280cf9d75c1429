use super::{Connector, Directory, DirectoryEntry, SearchRequest, SearchScope};
use crate::config::ExporterConfig;
use crate::error::Result;
use async_trait::async_trait;
use ldap3::{Ldap, LdapConnAsync, LdapConnSettings, Scope, SearchEntry};
use std::time::Duration;

/// Dials the configured server once per scrape.
#[derive(Debug, Clone)]
pub struct LdapConnector {
    uri: String,
    bind_dn: String,
    bind_pw: String,
    timeout: Duration,
}

impl LdapConnector {
    pub fn new(uri: String, bind_dn: String, bind_pw: String, timeout: Duration) -> Self {
        Self {
            uri,
            bind_dn,
            bind_pw,
            timeout,
        }
    }

    pub fn from_config(config: &ExporterConfig) -> Self {
        Self::new(
            config.ldap_uri.clone(),
            config.bind_dn.clone(),
            config.bind_pw.clone(),
            config.timeout(),
        )
    }
}

#[async_trait]
impl Connector for LdapConnector {
    async fn connect(&self) -> Result<Box<dyn Directory>> {
        let settings = LdapConnSettings::new().set_conn_timeout(self.timeout);
        let (conn, ldap) = LdapConnAsync::with_settings(settings, &self.uri).await?;
        let uri = self.uri.clone();
        tokio::spawn(async move {
            if let Err(e) = conn.drive().await {
                log::warn!("LDAP connection to {} terminated: {}", uri, e);
            }
        });

        let mut session = LdapSession {
            ldap,
            timeout: self.timeout,
        };
        if !self.bind_pw.is_empty() {
            session.bind(&self.bind_dn, &self.bind_pw).await?;
        }
        Ok(Box::new(session))
    }
}

/// A live `ldap3` handle. Dropping it ends the connection driver task.
pub struct LdapSession {
    ldap: Ldap,
    timeout: Duration,
}

impl LdapSession {
    async fn bind(&mut self, dn: &str, pw: &str) -> Result<()> {
        log::debug!("Binding as {}", dn);
        self.ldap
            .with_timeout(self.timeout)
            .simple_bind(dn, pw)
            .await?
            .success()?;
        Ok(())
    }
}

#[async_trait]
impl Directory for LdapSession {
    async fn search(&mut self, request: &SearchRequest) -> Result<Vec<DirectoryEntry>> {
        let scope = match request.scope {
            SearchScope::Base => Scope::Base,
            SearchScope::Subtree => Scope::Subtree,
        };
        let (entries, _) = self
            .ldap
            .with_timeout(self.timeout)
            .search(&request.base, scope, &request.filter, request.attributes.clone())
            .await?
            .success()?;

        Ok(entries
            .into_iter()
            .map(|raw| {
                let entry = SearchEntry::construct(raw);
                DirectoryEntry::from_attributes(entry.dn, entry.attrs)
            })
            .collect())
    }

    async fn close(&mut self) -> Result<()> {
        self.ldap.unbind().await?;
        Ok(())
    }
}
