pub mod coerce;
pub mod exposition;
pub mod sample;

pub use exposition::encode_text;
pub use sample::{MetricDesc, MetricKind, MetricSample};
