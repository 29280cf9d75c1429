pub mod config;
pub mod directory;
pub mod error;
pub mod exporter;
pub mod metrics;
pub mod probe;
pub mod server;

pub use config::{ConfigLoader, ExporterConfig};
pub use directory::{Connector, Directory, DirectoryEntry, LdapConnector, SearchRequest};
pub use error::{Error, Result};
pub use exporter::Exporter;
pub use metrics::{MetricDesc, MetricKind, MetricSample};
pub use probe::{PerformanceRecord, Probe, ReplicationAgreement, ServerIdentity};
