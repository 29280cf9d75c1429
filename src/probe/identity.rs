use crate::directory::{Directory, DirectoryEntry, SearchRequest};
use crate::error::{Error, Result};
use crate::metrics::{MetricDesc, MetricSample};

pub static INFO: MetricDesc = MetricDesc::gauge(
    "ibmslapd_info",
    "Could the ibmslapd server be reached",
    &["vendor", "version", "server_id"],
);

/// Identity advertised by the root DSE. Missing attributes are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerIdentity {
    pub vendor: String,
    pub version: String,
    pub server_id: String,
}

impl ServerIdentity {
    pub fn from_entry(entry: &DirectoryEntry) -> Self {
        Self {
            vendor: entry.first("vendorname").to_string(),
            version: entry.first("vendorversion").to_string(),
            server_id: entry.first("ibm-serverId").to_string(),
        }
    }

    /// Reads the root DSE. Fails only when the search errors or finds nothing.
    pub async fn probe(directory: &mut dyn Directory) -> Result<Self> {
        let request = SearchRequest::root_dse();
        let entries = directory.search(&request).await?;
        let entry = entries.first().ok_or_else(|| Error::EmptyResult {
            base: request.base.clone(),
        })?;
        Ok(Self::from_entry(entry))
    }

    pub fn sample(&self) -> MetricSample {
        INFO.sample(
            1.0,
            &[
                self.vendor.as_str(),
                self.version.as_str(),
                self.server_id.as_str(),
            ],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_vendor_attributes() {
        let entry = DirectoryEntry::new("")
            .with_attribute("vendorName", "International Business Machines (IBM)")
            .with_attribute("vendorVersion", "10.0.3")
            .with_attribute("ibm-serverId", "9d1c7a40-0000-4a4b-8f1e-000000000001");
        let identity = ServerIdentity::from_entry(&entry);
        assert_eq!(identity.vendor, "International Business Machines (IBM)");
        assert_eq!(identity.version, "10.0.3");
        assert_eq!(identity.server_id, "9d1c7a40-0000-4a4b-8f1e-000000000001");

        let sample = identity.sample();
        assert_eq!(sample.name(), "ibmslapd_info");
        assert_eq!(sample.value, 1.0);
        assert_eq!(sample.label("version"), Some("10.0.3"));
    }

    #[test]
    fn absent_attributes_default_to_empty() {
        let identity = ServerIdentity::from_entry(&DirectoryEntry::new(""));
        assert_eq!(identity, ServerIdentity::default());
        let sample = identity.sample();
        assert_eq!(sample.label("server_id"), Some(""));
    }
}
