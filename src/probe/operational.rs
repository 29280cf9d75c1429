use super::Probe;
use crate::directory::{Directory, DirectoryEntry, SearchRequest};
use crate::error::{Error, Result};
use crate::metrics::coerce::{self, attr};
use crate::metrics::{MetricDesc, MetricSample};
use async_trait::async_trait;

static ENTRIES_SENT: MetricDesc = MetricDesc::counter(
    "ibmslapd_entries_sent_total",
    "The number of entries that are sent by the server since the server was started.",
    &[],
);
static CURRENT_CONNECTIONS: MetricDesc = MetricDesc::gauge(
    "ibmslapd_current_connections",
    "The number of active connections.",
    &[],
);
static CURRENT_WORK_QUEUE_DEPTH: MetricDesc = MetricDesc::gauge(
    "ibmslapd_current_work_queue_depth",
    "The current depth of the work queue.",
    &[],
);
static IDLE_CONNECTIONS_CLOSED: MetricDesc = MetricDesc::gauge(
    "ibmslapd_idle_connections_closed",
    "The number of idle connections closed by the Automatic Connection Cleaner.",
    &[],
);
static AUTO_CONNECTION_CLEANER_RUN: MetricDesc = MetricDesc::gauge(
    "ibmslapd_auto_connection_cleaner_run",
    "The number of times that the Automatic Connection Cleaner is run.",
    &[],
);
static OPERATIONS_WAITING: MetricDesc = MetricDesc::gauge(
    "ibmslapd_operations_waiting",
    "The number of operations that are waiting in the deadlock detector.",
    &[],
);
static OPERATIONS_RETRIED: MetricDesc = MetricDesc::counter(
    "ibmslapd_operations_retried_total",
    "The number of operations retired due to deadlocks.",
    &[],
);
static OPERATIONS_DEADLOCKED: MetricDesc = MetricDesc::gauge(
    "ibmslapd_operations_deadlocked",
    "The number of operations in deadlock.",
    &[],
);
static CONNECTIONS: MetricDesc = MetricDesc::counter(
    "ibmslapd_connections_total",
    "The total number of connections of different kinds(tcp, ssl, tls) since the server was started.",
    &["connection"],
);
static WORKER_THREADS: MetricDesc = MetricDesc::gauge(
    "ibmslapd_worker_threads",
    "The number of threads in different states(read, write, live, idle). read: reading data from the client; write: sending data back to the client; live: used by the server; idle: available for work.",
    &["state"],
);
static OPERATIONS_REQUESTED: MetricDesc = MetricDesc::counter(
    "ibmslapd_operations_requested_total",
    "The number of requested operations of different kinds(search, bind, unbind, add, delete, modrdn, modify, compare, abandon, extop, unknownop) since the server was started.",
    &["operation"],
);
static OPERATIONS_COMPLETED: MetricDesc = MetricDesc::counter(
    "ibmslapd_operations_completed_total",
    "The number of completed operations of different kinds(search, bind, unbind, add, delete, modrdn, modify, compare, abandon, extop, unknownop) since the server was started.",
    &["operation"],
);
static OPERATIONS_FROM_SUPPLIERS: MetricDesc = MetricDesc::counter(
    "ibmslapd_operations_from_suppliers_total",
    "The number of operations of different kinds(add, delete, modrdn, modify) that are received from replication supplier.",
    &["operation"],
);
static START_TIME: MetricDesc = MetricDesc::gauge(
    "ibmslapd_start_time_seconds",
    "The time the server was started, in seconds since the Unix epoch.",
    &[],
);

/// Unlabeled pass-through metrics and the `cn=monitor` attribute each reads.
static SCALARS: [(&MetricDesc, &str); 8] = [
    (&ENTRIES_SENT, "entriessent"),
    (&CURRENT_CONNECTIONS, "currentconnections"),
    (&CURRENT_WORK_QUEUE_DEPTH, "current_workqueue_size"),
    (&IDLE_CONNECTIONS_CLOSED, "idle_connections_closed"),
    (&AUTO_CONNECTION_CLEANER_RUN, "auto_connection_cleaner_run"),
    (&OPERATIONS_WAITING, "operations_waiting"),
    (&OPERATIONS_RETRIED, "operations_retried"),
    (&OPERATIONS_DEADLOCKED, "operations_deadlocked"),
];

/// Worker thread state label and source attribute.
static WORKER_THREAD_STATES: [(&str, &str); 4] = [
    ("write", "writewaiters"),
    ("read", "readwaiters"),
    ("live", "livethreads"),
    ("idle", "available_workers"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Search,
    Bind,
    Unbind,
    Add,
    Delete,
    ModRdn,
    Modify,
    Compare,
    Abandon,
    ExtOp,
    UnknownOp,
}

impl Operation {
    pub const ALL: [Operation; 11] = [
        Operation::Search,
        Operation::Bind,
        Operation::Unbind,
        Operation::Add,
        Operation::Delete,
        Operation::ModRdn,
        Operation::Modify,
        Operation::Compare,
        Operation::Abandon,
        Operation::ExtOp,
        Operation::UnknownOp,
    ];

    /// Operations a consumer receives from its suppliers.
    pub const REPLICATED: [Operation; 4] = [
        Operation::Add,
        Operation::Delete,
        Operation::ModRdn,
        Operation::Modify,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Search => "search",
            Operation::Bind => "bind",
            Operation::Unbind => "unbind",
            Operation::Add => "add",
            Operation::Delete => "delete",
            Operation::ModRdn => "modrdn",
            Operation::Modify => "modify",
            Operation::Compare => "compare",
            Operation::Abandon => "abandon",
            Operation::ExtOp => "extop",
            Operation::UnknownOp => "unknownop",
        }
    }

    pub fn is_replicated(self) -> bool {
        Self::REPLICATED.contains(&self)
    }
}

/// Pluralized operation name as it appears in `cn=monitor` attribute names.
pub fn plural(operation: &str) -> String {
    match operation {
        "search" => "searches".to_string(),
        "modify" => "modifies".to_string(),
        _ => format!("{}s", operation),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ConnectionSplit {
    pub ssl: f64,
    pub tls: f64,
    /// Derived: everything that is neither SSL nor TLS.
    pub tcp: f64,
}

impl ConnectionSplit {
    pub fn new(total: f64, ssl: f64, tls: f64) -> Self {
        Self {
            ssl,
            tls,
            tcp: total - ssl - tls,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OperationCounts {
    pub operation: Operation,
    pub requested: f64,
    pub completed: f64,
    /// Only tracked for [`Operation::REPLICATED`].
    pub from_suppliers: Option<f64>,
}

/// Point-in-time view of `cn=monitor`.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationalSnapshot {
    pub scalars: Vec<(&'static MetricDesc, f64)>,
    pub connections: ConnectionSplit,
    pub worker_threads: Vec<(&'static str, f64)>,
    pub operations: Vec<OperationCounts>,
    pub start_time: Option<i64>,
}

impl OperationalSnapshot {
    pub fn from_entry(entry: &DirectoryEntry) -> Self {
        let scalars = SCALARS
            .iter()
            .map(|(desc, attribute)| (*desc, attr(entry, attribute)))
            .collect();

        let connections = ConnectionSplit::new(
            attr(entry, "totalconnections"),
            attr(entry, "total_ssl_connections"),
            attr(entry, "total_tls_connections"),
        );

        let worker_threads = WORKER_THREAD_STATES
            .iter()
            .map(|(state, attribute)| (*state, attr(entry, attribute)))
            .collect();

        let operations = Operation::ALL
            .iter()
            .map(|&operation| {
                let stem = plural(operation.as_str());
                OperationCounts {
                    operation,
                    requested: attr(entry, &format!("{}requested", stem)),
                    completed: attr(entry, &format!("{}completed", stem)),
                    from_suppliers: operation
                        .is_replicated()
                        .then(|| attr(entry, &format!("{}fromsuppliers", stem))),
                }
            })
            .collect();

        Self {
            scalars,
            connections,
            worker_threads,
            operations,
            start_time: coerce::timestamp_as(entry.first("starttime"), coerce::MONITOR_TIME_FORMAT),
        }
    }

    pub fn samples(&self) -> Vec<MetricSample> {
        let mut samples: Vec<MetricSample> = self
            .scalars
            .iter()
            .map(|(desc, value)| desc.sample(*value, &[]))
            .collect();

        samples.push(CONNECTIONS.sample(self.connections.ssl, &["ssl"]));
        samples.push(CONNECTIONS.sample(self.connections.tls, &["tls"]));
        samples.push(CONNECTIONS.sample(self.connections.tcp, &["tcp"]));

        for (state, value) in &self.worker_threads {
            samples.push(WORKER_THREADS.sample(*value, &[*state]));
        }

        for counts in &self.operations {
            let label = counts.operation.as_str();
            samples.push(OPERATIONS_REQUESTED.sample(counts.requested, &[label]));
            samples.push(OPERATIONS_COMPLETED.sample(counts.completed, &[label]));
        }
        for counts in &self.operations {
            if let Some(value) = counts.from_suppliers {
                samples.push(OPERATIONS_FROM_SUPPLIERS.sample(value, &[counts.operation.as_str()]));
            }
        }

        if let Some(start) = self.start_time {
            samples.push(START_TIME.sample(start as f64, &[]));
        }
        samples
    }
}

/// Server-wide counters from `cn=monitor`.
#[derive(Debug, Default)]
pub struct OperationalProbe;

impl OperationalProbe {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Probe for OperationalProbe {
    fn name(&self) -> &'static str {
        "cn=monitor"
    }

    fn descriptors(&self) -> Vec<&'static MetricDesc> {
        let mut descriptors: Vec<&'static MetricDesc> = SCALARS.iter().map(|(desc, _)| *desc).collect();
        descriptors.extend([
            &CONNECTIONS,
            &WORKER_THREADS,
            &OPERATIONS_REQUESTED,
            &OPERATIONS_COMPLETED,
            &OPERATIONS_FROM_SUPPLIERS,
            &START_TIME,
        ]);
        descriptors
    }

    async fn collect(&self, directory: &mut dyn Directory) -> Result<Vec<MetricSample>> {
        let request = SearchRequest::monitor();
        let entries = directory.search(&request).await?;
        let entry = entries.first().ok_or_else(|| Error::EmptyResult {
            base: request.base.clone(),
        })?;
        Ok(OperationalSnapshot::from_entry(entry).samples())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monitor_entry() -> DirectoryEntry {
        DirectoryEntry::new("cn=monitor")
            .with_attribute("entriessent", "52311")
            .with_attribute("currentconnections", "17")
            .with_attribute("current_workqueue_size", "2")
            .with_attribute("totalconnections", "1000")
            .with_attribute("total_ssl_connections", "250")
            .with_attribute("total_tls_connections", "50")
            .with_attribute("writewaiters", "1")
            .with_attribute("readwaiters", "3")
            .with_attribute("livethreads", "15")
            .with_attribute("available_workers", "11")
            .with_attribute("searchesrequested", "900")
            .with_attribute("searchescompleted", "899")
            .with_attribute("modifiesrequested", "40")
            .with_attribute("modifiescompleted", "40")
            .with_attribute("addsfromsuppliers", "7")
            .with_attribute("modifiesfromsuppliers", "5")
            .with_attribute("operations_retried", "N/A")
            .with_attribute("starttime", "2024-01-01 00:00:00 GMT")
    }

    fn find<'a>(samples: &'a [MetricSample], name: &str, label: Option<&str>) -> &'a MetricSample {
        samples
            .iter()
            .find(|s| s.name() == name && label.is_none_or(|l| s.label_values.iter().any(|v| v == l)))
            .unwrap_or_else(|| panic!("missing {} {:?}", name, label))
    }

    #[test]
    fn pluralization() {
        assert_eq!(plural("search"), "searches");
        assert_eq!(plural("modify"), "modifies");
        for op in ["bind", "unbind", "add", "delete", "modrdn", "compare", "abandon", "extop", "unknownop"] {
            assert_eq!(plural(op), format!("{}s", op));
        }
    }

    #[test]
    fn connection_split_sums_to_total() {
        for (total, ssl, tls) in [(1000.0, 250.0, 50.0), (0.0, 0.0, 0.0), (10.0, 4.0, 6.0), (3.0, 0.0, 0.0)] {
            let split = ConnectionSplit::new(total, ssl, tls);
            assert_eq!(split.tcp + split.ssl + split.tls, total);
        }
    }

    #[test]
    fn maps_scalars() {
        let samples = OperationalSnapshot::from_entry(&monitor_entry()).samples();
        assert_eq!(find(&samples, "ibmslapd_entries_sent_total", None).value, 52311.0);
        assert_eq!(find(&samples, "ibmslapd_current_connections", None).value, 17.0);
        assert_eq!(find(&samples, "ibmslapd_current_work_queue_depth", None).value, 2.0);
        assert_eq!(find(&samples, "ibmslapd_operations_retried_total", None).value, 0.0);
        assert_eq!(find(&samples, "ibmslapd_operations_deadlocked", None).value, 0.0);
        assert_eq!(find(&samples, "ibmslapd_start_time_seconds", None).value, 1_704_067_200.0);
    }

    #[test]
    fn maps_connection_kinds() {
        let samples = OperationalSnapshot::from_entry(&monitor_entry()).samples();
        assert_eq!(find(&samples, "ibmslapd_connections_total", Some("ssl")).value, 250.0);
        assert_eq!(find(&samples, "ibmslapd_connections_total", Some("tls")).value, 50.0);
        assert_eq!(find(&samples, "ibmslapd_connections_total", Some("tcp")).value, 700.0);
    }

    #[test]
    fn maps_worker_threads_in_fixed_order() {
        let samples = OperationalSnapshot::from_entry(&monitor_entry()).samples();
        let states: Vec<(&str, f64)> = samples
            .iter()
            .filter(|s| s.name() == "ibmslapd_worker_threads")
            .map(|s| (s.label("state").unwrap_or_default(), s.value))
            .collect();
        assert_eq!(states, vec![("write", 1.0), ("read", 3.0), ("live", 15.0), ("idle", 11.0)]);
    }

    #[test]
    fn maps_operations() {
        let samples = OperationalSnapshot::from_entry(&monitor_entry()).samples();
        let requested: Vec<_> = samples
            .iter()
            .filter(|s| s.name() == "ibmslapd_operations_requested_total")
            .collect();
        assert_eq!(requested.len(), 11);
        assert_eq!(find(&samples, "ibmslapd_operations_requested_total", Some("search")).value, 900.0);
        assert_eq!(find(&samples, "ibmslapd_operations_completed_total", Some("search")).value, 899.0);
        assert_eq!(find(&samples, "ibmslapd_operations_requested_total", Some("modify")).value, 40.0);
        assert_eq!(find(&samples, "ibmslapd_operations_requested_total", Some("extop")).value, 0.0);

        let suppliers: Vec<_> = samples
            .iter()
            .filter(|s| s.name() == "ibmslapd_operations_from_suppliers_total")
            .map(|s| (s.label("operation").unwrap_or_default(), s.value))
            .collect();
        assert_eq!(
            suppliers,
            vec![("add", 7.0), ("delete", 0.0), ("modrdn", 0.0), ("modify", 5.0)]
        );
    }

    #[test]
    fn empty_entry_degrades_to_zero() {
        let samples = OperationalSnapshot::from_entry(&DirectoryEntry::new("cn=monitor")).samples();
        assert!(samples.iter().all(|s| s.value == 0.0));
        assert!(samples.iter().all(|s| s.name() != "ibmslapd_start_time_seconds"));
        // 8 scalars, 3 connection kinds, 4 thread states, 22 op counters, 4 supplier counters
        assert_eq!(samples.len(), 41);
    }

    #[test]
    fn samples_only_use_declared_families() {
        let probe = OperationalProbe::new();
        let declared = probe.descriptors();
        let samples = OperationalSnapshot::from_entry(&monitor_entry()).samples();
        for sample in &samples {
            assert!(declared.iter().any(|d| std::ptr::eq(*d, sample.desc)), "{}", sample.name());
        }
    }
}
