//! resque-metrics — turns Resque's Redis state into Prometheus metrics.
//!
//! One scrape reads processed/failed counters, queue depths, failed-queue
//! depths and worker liveness from a [`QueueBackend`], producing a list of
//! typed [`Sample`]s that [`render_prometheus`] turns into the text
//! exposition format.
//!
//! # Architecture
//!
//! ```text
//! Collector<B: QueueBackend>
//!   ├── collect() ← called once per HTTP scrape
//!   │     ├── scrape()   sequential backend reads, stops at first error
//!   │     └── finalize   duration, up, scrapes_total, failed_scrapes_total
//!   └── counters survive across scrapes (atomics)
//!
//! Prometheus exposition
//!   └── render_prometheus() → text/plain for the telemetry endpoint
//! ```
//!
//! [`QueueBackend`]: resque_backend::QueueBackend

pub mod collector;
pub mod prometheus;
pub mod sample;

pub use collector::{Collector, ScrapeOutcome};
pub use prometheus::{render_prometheus, CONTENT_TYPE};
pub use sample::{MetricDesc, MetricKind, Sample, NAMESPACE};
