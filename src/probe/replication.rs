use super::Probe;
use super::performance::PerformanceRecord;
use crate::directory::{Directory, DirectoryEntry, SearchRequest};
use crate::error::Result;
use crate::metrics::coerce::{self, attr};
use crate::metrics::{MetricDesc, MetricSample};
use async_trait::async_trait;

/// States reported one-hot on `ibmslapd_replication_state`.
pub const KNOWN_STATES: [&str; 8] = [
    "active",
    "ready",
    "retrying",
    "waiting",
    "binding",
    "connecting",
    "on hold",
    "error log full",
];

const CONSUMER: &[&str] = &["consumer"];
const CONSUMER_CONNECTION: &[&str] = &["consumer", "connection"];

static STATE: MetricDesc = MetricDesc::gauge(
    "ibmslapd_replication_state",
    "The current state of replication with this consumer.",
    &["consumer", "state"],
);
static LAST_ACTIVATION: MetricDesc = MetricDesc::counter(
    "ibmslapd_replication_last_activation_seconds",
    "The time that the last replication session started between this supplier and consumer.",
    CONSUMER,
);
static LAST_FINISH: MetricDesc = MetricDesc::counter(
    "ibmslapd_replication_last_finish_seconds",
    "The time that the last replication session finished between this supplier and consumer.",
    CONSUMER,
);
static LAST_CHANGE_ID: MetricDesc = MetricDesc::counter(
    "ibmslapd_replication_last_change_id",
    "The change ID of the last update sent to this consumer.",
    CONSUMER,
);
static PENDING_CHANGES: MetricDesc = MetricDesc::gauge(
    "ibmslapd_replication_pending_changes",
    "The number of updates queued to be replicated to this consumer.",
    CONSUMER,
);
static FAILED_CHANGES: MetricDesc = MetricDesc::gauge(
    "ibmslapd_replication_failed_changes",
    "The count of the failures logged for this replication agreement.",
    CONSUMER,
);
static QUIESCED: MetricDesc = MetricDesc::gauge(
    "ibmslapd_replication_quiesced",
    "Whether the replication context of this agreement is quiesced (1) or not (0).",
    CONSUMER,
);

/// One gauge per performance field, same order as [`super::performance::VALUE_KEYS`].
static PERFORMANCE: [MetricDesc; 13] = [
    MetricDesc::gauge(
        "ibmslapd_replication_performance_queue_size_limit",
        "This is the size limit for each queue.",
        CONSUMER_CONNECTION,
    ),
    MetricDesc::gauge(
        "ibmslapd_replication_performance_last_operation_id",
        "The replication ID of the last operation assigned to the send queue of the connection.",
        CONSUMER_CONNECTION,
    ),
    MetricDesc::gauge(
        "ibmslapd_replication_performance_send_queue_size",
        "The current size (number of operations) of the send queue.",
        CONSUMER_CONNECTION,
    ),
    MetricDesc::gauge(
        "ibmslapd_replication_performance_dependent_updates",
        "The count of dependent updates.",
        CONSUMER_CONNECTION,
    ),
    MetricDesc::gauge(
        "ibmslapd_replication_performance_send_queue_limit_hits",
        "The number of times the send queue hit the size limit.",
        CONSUMER_CONNECTION,
    ),
    MetricDesc::gauge(
        "ibmslapd_replication_performance_dependent_updates_sent",
        "The number of dependent updates sent.",
        CONSUMER_CONNECTION,
    ),
    MetricDesc::gauge(
        "ibmslapd_replication_performance_send_queue_waited",
        "The number of times the send queue waited for a dependent update before sending additional updates.",
        CONSUMER_CONNECTION,
    ),
    MetricDesc::gauge(
        "ibmslapd_replication_performance_receive_queue_limit_hits",
        "The number of times the receive queue hit the size limit.",
        CONSUMER_CONNECTION,
    ),
    MetricDesc::gauge(
        "ibmslapd_replication_performance_updates_acknowledged",
        "The number of updates where results have been received.",
        CONSUMER_CONNECTION,
    ),
    MetricDesc::gauge(
        "ibmslapd_replication_performance_updates_sent",
        "The number of updates sent to a consumer since start-up.",
        CONSUMER_CONNECTION,
    ),
    MetricDesc::gauge(
        "ibmslapd_replication_performance_errors_reported",
        "The number of replication errors reported by the consumer.",
        CONSUMER_CONNECTION,
    ),
    MetricDesc::gauge(
        "ibmslapd_replication_performance_sender_sessions",
        "The session count for the sender thread (incremented when the connection to the consumer is established).",
        CONSUMER_CONNECTION,
    ),
    MetricDesc::gauge(
        "ibmslapd_replication_performance_receiver_sessions",
        "The session count for the receiver thread.",
        CONSUMER_CONNECTION,
    ),
];

/// Matches states of the form `error <N>`, e.g. `error 42`.
pub fn is_error_state(state: &str) -> bool {
    let Some(rest) = state.strip_prefix("error") else {
        return false;
    };
    if !rest.starts_with(char::is_whitespace) {
        return false;
    }
    let rest = rest.trim_start();
    let digits = rest.strip_prefix(['+', '-']).unwrap_or(rest);
    digits.starts_with(|c: char| c.is_ascii_digit())
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReplicationAgreement {
    pub consumer_id: String,
    pub state: String,
    pub last_activation: Option<i64>,
    pub last_finish: Option<i64>,
    pub last_change_id: f64,
    pub pending_changes: f64,
    pub failed_changes: f64,
    pub quiesced: Option<bool>,
    pub performance: Vec<PerformanceRecord>,
}

impl ReplicationAgreement {
    /// `None` for entries without a replication state; those are not agreements.
    pub fn from_entry(entry: &DirectoryEntry) -> Option<Self> {
        let state = entry.first("ibm-replicationState");
        if state.is_empty() {
            return None;
        }

        let quiesced = match entry.first("ibm-replicationIsQuiesced") {
            "" => None,
            text => Some(coerce::boolean(text)),
        };

        Some(Self {
            consumer_id: entry.first("cn").to_string(),
            state: state.to_string(),
            last_activation: coerce::timestamp(entry.first("ibm-replicationLastActivationTime")),
            last_finish: coerce::timestamp(entry.first("ibm-replicationLastFinishTime")),
            last_change_id: attr(entry, "ibm-replicationLastChangeId"),
            pending_changes: attr(entry, "ibm-replicationPendingChangeCount"),
            failed_changes: attr(entry, "ibm-replicationFailedChangeCount"),
            quiesced,
            performance: entry
                .values("ibm-replicationPerformance")
                .iter()
                .map(|text| PerformanceRecord::parse(text))
                .collect(),
        })
    }

    pub fn is_error(&self) -> bool {
        is_error_state(&self.state)
    }

    pub fn samples(&self) -> Vec<MetricSample> {
        let consumer = self.consumer_id.as_str();
        let mut samples = Vec::with_capacity(15 + self.performance.len() * PERFORMANCE.len());

        for known in KNOWN_STATES {
            let value = if self.state == known { 1.0 } else { 0.0 };
            samples.push(STATE.sample(value, &[consumer, known]));
        }
        let error = if self.is_error() { 1.0 } else { 0.0 };
        samples.push(STATE.sample(error, &[consumer, "error"]));

        if let Some(t) = self.last_activation {
            samples.push(LAST_ACTIVATION.sample(t as f64, &[consumer]));
        }
        if let Some(t) = self.last_finish {
            samples.push(LAST_FINISH.sample(t as f64, &[consumer]));
        }
        samples.push(LAST_CHANGE_ID.sample(self.last_change_id, &[consumer]));
        samples.push(PENDING_CHANGES.sample(self.pending_changes, &[consumer]));
        samples.push(FAILED_CHANGES.sample(self.failed_changes, &[consumer]));
        if let Some(quiesced) = self.quiesced {
            samples.push(QUIESCED.sample(if quiesced { 1.0 } else { 0.0 }, &[consumer]));
        }

        for record in &self.performance {
            let connection = record.connection.to_string();
            for (desc, (_, value)) in PERFORMANCE.iter().zip(record.fields()) {
                samples.push(desc.sample(value, &[consumer, connection.as_str()]));
            }
        }
        samples
    }
}

/// Per-consumer replication state and throughput.
#[derive(Debug, Default)]
pub struct ReplicationProbe;

impl ReplicationProbe {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Probe for ReplicationProbe {
    fn name(&self) -> &'static str {
        "replication agreements"
    }

    fn descriptors(&self) -> Vec<&'static MetricDesc> {
        let mut descriptors: Vec<&'static MetricDesc> = vec![
            &STATE,
            &LAST_ACTIVATION,
            &LAST_FINISH,
            &LAST_CHANGE_ID,
            &PENDING_CHANGES,
            &FAILED_CHANGES,
            &QUIESCED,
        ];
        descriptors.extend(PERFORMANCE.iter());
        descriptors
    }

    async fn collect(&self, directory: &mut dyn Directory) -> Result<Vec<MetricSample>> {
        let entries = directory
            .search(&SearchRequest::replication_agreements())
            .await?;

        let agreements: Vec<ReplicationAgreement> = entries
            .iter()
            .filter_map(ReplicationAgreement::from_entry)
            .collect();
        log::debug!(
            "Found {} replication agreements in {} entries",
            agreements.len(),
            entries.len()
        );

        Ok(agreements.iter().flat_map(ReplicationAgreement::samples).collect())
    }
}
