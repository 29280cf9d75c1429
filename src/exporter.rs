use crate::config::ExporterConfig;
use crate::directory::{Connector, Directory, LdapConnector};
use crate::metrics::{MetricDesc, MetricSample};
use crate::probe::{OperationalProbe, Probe, ReplicationProbe, ServerIdentity, identity};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

pub static UP: MetricDesc = MetricDesc::gauge("ibmslapd_up", "Could the ibmslapd server be reached", &[]);

pub static BUILD_INFO: MetricDesc = MetricDesc::gauge(
    "ibmslapd_exporter_build_info",
    "A metric with a constant '1' value labeled by the version of ibmslapd_exporter.",
    &["version"],
);

pub fn build_info() -> MetricSample {
    BUILD_INFO.sample(1.0, &[env!("CARGO_PKG_VERSION")])
}

/// Runs scrapes against the directory server, one at a time.
///
/// Every call to [`Exporter::collect`] opens its own session, runs the
/// identity query and then each probe in order, and closes the session
/// before the next scrape may start.
pub struct Exporter {
    connector: Arc<dyn Connector>,
    probes: Vec<Box<dyn Probe>>,
    scrape_lock: Mutex<()>,
}

impl Exporter {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self::with_probes(
            connector,
            vec![Box::new(OperationalProbe::new()), Box::new(ReplicationProbe::new())],
        )
    }

    pub fn with_probes(connector: Arc<dyn Connector>, probes: Vec<Box<dyn Probe>>) -> Self {
        Self {
            connector,
            probes,
            scrape_lock: Mutex::new(()),
        }
    }

    pub fn from_config(config: &ExporterConfig) -> Self {
        Self::new(Arc::new(LdapConnector::from_config(config)))
    }

    /// All metric families a scrape may produce.
    pub fn descriptors(&self) -> Vec<&'static MetricDesc> {
        let mut descriptors = vec![&UP, &identity::INFO];
        for probe in &self.probes {
            descriptors.extend(probe.descriptors());
        }
        descriptors
    }

    /// Performs one scrape. Failures never escape: an unreachable server
    /// yields a single `ibmslapd_up 0` sample.
    pub async fn collect(&self) -> Vec<MetricSample> {
        let _guard = self.scrape_lock.lock().await;
        let started = Instant::now();

        let mut directory = match self.connector.connect().await {
            Ok(directory) => directory,
            Err(e) => {
                log::error!("Error contacting LDAP server: {}", e);
                return vec![UP.sample(0.0, &[])];
            }
        };

        let samples = self.scrape(directory.as_mut()).await;

        if let Err(e) = directory.close().await {
            log::debug!("Error closing LDAP session: {}", e);
        }
        log::debug!(
            "Scrape finished with {} samples in {}ms",
            samples.len(),
            started.elapsed().as_millis()
        );
        samples
    }

    async fn scrape(&self, directory: &mut dyn Directory) -> Vec<MetricSample> {
        let identity = match ServerIdentity::probe(directory).await {
            Ok(identity) => identity,
            Err(e) => {
                log::error!("Error querying Root DSE: {}", e);
                return vec![UP.sample(0.0, &[])];
            }
        };

        let mut samples = vec![UP.sample(1.0, &[]), identity.sample()];
        for probe in &self.probes {
            match probe.collect(directory).await {
                Ok(mut probe_samples) => samples.append(&mut probe_samples),
                Err(e) => log::error!("Error querying {}: {}", probe.name(), e),
            }
        }
        samples
    }
}
