//! Scrape collector — reads Resque's Redis state once per scrape.
//!
//! Backend reads run strictly in sequence since later steps depend on earlier
//! results (queue names gate the per-queue length lookups). The first failed
//! read aborts the rest of the scrape; the duration, `up` and cumulative
//! counter samples are emitted on every exit path.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use tracing::{debug, error};

use resque_backend::{BackendError, BackendResult, KeyNamespace, QueueBackend};

use crate::sample::{
    Sample, FAILED_JOB_EXECUTIONS, FAILED_SCRAPES, JOBS_IN_FAILED_QUEUE, JOBS_IN_QUEUE,
    JOB_EXECUTIONS, SCRAPES, SCRAPE_DURATION, UP, WORKERS, WORKING_WORKERS,
};

/// Key of the single failed queue used by Resque before `failed_queues`.
const LEGACY_FAILED_QUEUE: &str = "failed";

/// Result of one scrape.
#[derive(Debug)]
pub struct ScrapeOutcome {
    /// Samples in emission order, always ending with duration, `up` and
    /// the two scrape counters.
    pub samples: Vec<Sample>,
    pub duration: Duration,
    /// The backend error that aborted the scrape, if any.
    pub error: Option<BackendError>,
}

impl ScrapeOutcome {
    pub fn is_up(&self) -> bool {
        self.error.is_none()
    }

    /// All samples of one metric family.
    pub fn family<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Sample> + 'a {
        self.samples.iter().filter(move |s| s.name() == name)
    }

    /// Value of the sample with this name and exactly these labels.
    pub fn value(&self, name: &str, labels: &[(&str, &str)]) -> Option<f64> {
        self.family(name)
            .find(|s| {
                s.labels.len() == labels.len()
                    && labels.iter().all(|(k, v)| s.label(k) == Some(*v))
            })
            .map(|s| s.value)
    }
}

/// Collects Resque metrics from a backend.
///
/// Safe to share across concurrent scrapes; the two cumulative counters are
/// the only state kept between calls.
pub struct Collector<B> {
    backend: B,
    namespace: KeyNamespace,
    /// Total scrapes since construction.
    scrapes: AtomicU64,
    /// Scrapes aborted by a backend error.
    failed_scrapes: AtomicU64,
}

impl<B: QueueBackend> Collector<B> {
    pub fn new(backend: B, namespace: KeyNamespace) -> Self {
        Self {
            backend,
            namespace,
            scrapes: AtomicU64::new(0),
            failed_scrapes: AtomicU64::new(0),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn namespace(&self) -> &KeyNamespace {
        &self.namespace
    }

    pub fn scrapes_total(&self) -> u64 {
        self.scrapes.load(Ordering::Relaxed)
    }

    pub fn failed_scrapes_total(&self) -> u64 {
        self.failed_scrapes.load(Ordering::Relaxed)
    }

    /// Run one scrape and return every sample it produced.
    ///
    /// Never fails: a backend error is logged, counted, and reported as
    /// `up 0` alongside the samples gathered before it.
    pub async fn collect(&self) -> ScrapeOutcome {
        self.scrapes.fetch_add(1, Ordering::Relaxed);
        let start = Instant::now();

        let mut samples = Vec::new();
        let result = self.scrape(&mut samples).await;

        let duration = start.elapsed();
        samples.push(Sample::new(&SCRAPE_DURATION, duration.as_secs_f64()));

        let error = match result {
            Ok(()) => {
                samples.push(Sample::new(&UP, 1.0));
                None
            }
            Err(e) => {
                self.failed_scrapes.fetch_add(1, Ordering::Relaxed);
                error!(namespace = %self.namespace, error = %e, "resque scrape failed");
                samples.push(Sample::new(&UP, 0.0));
                Some(e)
            }
        };

        samples.push(Sample::new(&FAILED_SCRAPES, self.failed_scrapes_total() as f64));
        samples.push(Sample::new(&SCRAPES, self.scrapes_total() as f64));

        debug!(
            namespace = %self.namespace,
            duration_ms = duration.as_millis() as u64,
            samples = samples.len(),
            up = error.is_none(),
            "resque scrape finished"
        );

        ScrapeOutcome {
            samples,
            duration,
            error,
        }
    }

    /// The backend reads, in order. Returns at the first error.
    async fn scrape(&self, out: &mut Vec<Sample>) -> BackendResult<()> {
        let ns = &self.namespace;
        let backend = &self.backend;

        let executions = backend.get_f64(&ns.key(&["stat", "processed"])).await?;
        out.push(Sample::new(&JOB_EXECUTIONS, executions));

        let failed_executions = backend.get_f64(&ns.key(&["stat", "failed"])).await?;
        out.push(Sample::new(&FAILED_JOB_EXECUTIONS, failed_executions));

        for queue in backend.smembers(&ns.key(&["queues"])).await? {
            let jobs = backend.llen(&ns.key(&["queue", &queue])).await?;
            out.push(Sample::new(&JOBS_IN_QUEUE, jobs as f64).with_label("queue", queue));
        }

        // Failed queue names are already full keys under the namespace.
        for queue in self.failed_queues().await? {
            let jobs = backend.llen(&ns.key(&[&queue])).await?;
            out.push(Sample::new(&JOBS_IN_FAILED_QUEUE, jobs as f64).with_label("queue", queue));
        }

        let workers = backend.smembers(&ns.key(&["workers"])).await?;
        out.push(Sample::new(&WORKERS, workers.len() as f64));

        let mut working = 0u64;
        for worker in &workers {
            if backend.exists(&ns.key(&["worker", worker])).await? {
                working += 1;
            }
        }
        out.push(Sample::new(&WORKING_WORKERS, working as f64));

        Ok(())
    }

    /// Members of `failed_queues`, or the legacy single `failed` list when
    /// that set is empty.
    async fn failed_queues(&self) -> BackendResult<Vec<String>> {
        let ns = &self.namespace;
        let queues = self.backend.smembers(&ns.key(&["failed_queues"])).await?;
        if !queues.is_empty() {
            return Ok(queues);
        }
        if self.backend.exists(&ns.key(&[LEGACY_FAILED_QUEUE])).await? {
            return Ok(vec![LEGACY_FAILED_QUEUE.to_string()]);
        }
        Ok(Vec::new())
    }
}
