//! Probes translate directory entries into metric samples.

pub mod identity;
pub mod operational;
pub mod performance;
pub mod replication;

use crate::directory::Directory;
use crate::error::Result;
use crate::metrics::{MetricDesc, MetricSample};
use async_trait::async_trait;

pub use identity::ServerIdentity;
pub use operational::{OperationalProbe, OperationalSnapshot};
pub use performance::PerformanceRecord;
pub use replication::{ReplicationAgreement, ReplicationProbe};

/// One query against an open session and the samples it maps to.
#[async_trait]
pub trait Probe: Send + Sync {
    /// Short description used in log lines.
    fn name(&self) -> &'static str;

    /// Every metric family this probe can emit.
    fn descriptors(&self) -> Vec<&'static MetricDesc>;

    async fn collect(&self, directory: &mut dyn Directory) -> Result<Vec<MetricSample>>;
}
