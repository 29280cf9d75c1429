#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Counter,
    Gauge,
}

/// Static description of a metric family. Name, kind and label schema never
/// vary between samples of the same family.
#[derive(Debug, PartialEq, Eq)]
pub struct MetricDesc {
    pub name: &'static str,
    pub help: &'static str,
    pub kind: MetricKind,
    pub labels: &'static [&'static str],
}

impl MetricDesc {
    pub const fn counter(name: &'static str, help: &'static str, labels: &'static [&'static str]) -> Self {
        Self {
            name,
            help,
            kind: MetricKind::Counter,
            labels,
        }
    }

    pub const fn gauge(name: &'static str, help: &'static str, labels: &'static [&'static str]) -> Self {
        Self {
            name,
            help,
            kind: MetricKind::Gauge,
            labels,
        }
    }

    pub fn sample(&'static self, value: f64, label_values: &[&str]) -> MetricSample {
        MetricSample::new(self, value, label_values)
    }
}

/// A single labeled value produced by a probe.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSample {
    pub desc: &'static MetricDesc,
    pub label_values: Vec<String>,
    pub value: f64,
}

impl MetricSample {
    pub fn new(desc: &'static MetricDesc, value: f64, label_values: &[&str]) -> Self {
        debug_assert_eq!(
            desc.labels.len(),
            label_values.len(),
            "label arity mismatch for {}",
            desc.name
        );
        Self {
            desc,
            label_values: label_values.iter().map(|v| v.to_string()).collect(),
            value,
        }
    }

    pub fn name(&self) -> &'static str {
        self.desc.name
    }

    pub fn kind(&self) -> MetricKind {
        self.desc.kind
    }

    /// Ordered (key, value) label pairs.
    pub fn labels(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        self.desc
            .labels
            .iter()
            .copied()
            .zip(self.label_values.iter().map(String::as_str))
    }

    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels().find(|(k, _)| *k == key).map(|(_, v)| v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static TEST_DESC: MetricDesc = MetricDesc::gauge("test_metric", "A test metric.", &["consumer", "connection"]);

    #[test]
    fn labels_pair_keys_with_values_in_order() {
        let sample = TEST_DESC.sample(3.0, &["dir02", "1"]);
        let labels: Vec<_> = sample.labels().collect();
        assert_eq!(labels, vec![("consumer", "dir02"), ("connection", "1")]);
        assert_eq!(sample.label("connection"), Some("1"));
        assert_eq!(sample.label("state"), None);
        assert_eq!(sample.kind(), MetricKind::Gauge);
    }
}
