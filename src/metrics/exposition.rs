//! OpenMetrics text exposition through `prometheus-client`.
//!
//! Each scrape produces a fresh set of samples. [`ScrapeCollector`] hands
//! them to a throwaway registry as const metrics, one family per static
//! descriptor.

use crate::error::Result;
use crate::metrics::sample::{MetricDesc, MetricKind, MetricSample};
use prometheus_client::collector::Collector;
use prometheus_client::encoding::{text, DescriptorEncoder, EncodeMetric, MetricEncoder};
use prometheus_client::metrics::counter::ConstCounter;
use prometheus_client::metrics::gauge::ConstGauge;
use prometheus_client::metrics::MetricType;
use prometheus_client::registry::Registry;

pub const CONTENT_TYPE: &str = "application/openmetrics-text; version=1.0.0; charset=utf-8";

const COUNTER_SUFFIX: &str = "_total";

/// Samples of a single scrape, grouped into families.
#[derive(Debug)]
pub struct ScrapeCollector {
    families: Vec<(&'static MetricDesc, Vec<MetricSample>)>,
}

impl ScrapeCollector {
    /// Families follow `descriptors` order. Samples of undeclared families
    /// go last, in order of first appearance. Empty families are dropped.
    pub fn new(descriptors: &[&'static MetricDesc], samples: Vec<MetricSample>) -> Self {
        let mut families: Vec<(&'static MetricDesc, Vec<MetricSample>)> =
            descriptors.iter().map(|desc| (*desc, Vec::new())).collect();
        for sample in samples {
            match families.iter_mut().find(|(desc, _)| desc.name == sample.name()) {
                Some((_, members)) => members.push(sample),
                None => families.push((sample.desc, vec![sample])),
            }
        }
        families.retain(|(_, members)| !members.is_empty());
        Self { families }
    }
}

impl Collector for ScrapeCollector {
    fn encode(&self, mut encoder: DescriptorEncoder<'_>) -> std::result::Result<(), std::fmt::Error> {
        for (desc, samples) in &self.families {
            let (family, metric_type) = family_shape(desc);
            let counter = matches!(metric_type, MetricType::Counter);
            let mut metric_encoder = encoder.encode_descriptor(family, desc.help, None, metric_type)?;

            if desc.labels.is_empty() {
                if let Some(sample) = samples.first() {
                    encode_value(counter, sample.value, metric_encoder)?;
                }
                continue;
            }
            for sample in samples {
                let labels: Vec<(&str, &str)> = sample.labels().collect();
                encode_value(counter, sample.value, metric_encoder.encode_family(&labels)?)?;
            }
        }
        Ok(())
    }
}

/// Counter sample lines always carry the `_total` suffix, so counter families
/// are declared without it. Counters whose name has no such suffix keep their
/// exact name and are typed `unknown`.
fn family_shape(desc: &'static MetricDesc) -> (&'static str, MetricType) {
    match desc.kind {
        MetricKind::Gauge => (desc.name, MetricType::Gauge),
        MetricKind::Counter => match desc.name.strip_suffix(COUNTER_SUFFIX) {
            Some(family) => (family, MetricType::Counter),
            None => (desc.name, MetricType::Unknown),
        },
    }
}

fn encode_value(counter: bool, value: f64, encoder: MetricEncoder) -> std::fmt::Result {
    if counter {
        ConstCounter::new(value).encode(encoder)
    } else {
        ConstGauge::new(value).encode(encoder)
    }
}

/// Renders one scrape in the OpenMetrics text format.
pub fn encode_text(descriptors: &[&'static MetricDesc], samples: Vec<MetricSample>) -> Result<String> {
    let mut registry = Registry::default();
    registry.register_collector(Box::new(ScrapeCollector::new(descriptors, samples)));

    let mut output = String::new();
    text::encode(&mut output, &registry)?;
    Ok(output)
}
