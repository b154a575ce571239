//! Metric descriptors and samples.

use std::collections::BTreeMap;

/// Prefix shared by every exported metric name.
pub const NAMESPACE: &str = "resque";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Counter,
    Gauge,
}

impl MetricKind {
    /// Name used on the `# TYPE` line.
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
        }
    }
}

/// Static description of a metric family.
#[derive(Debug, PartialEq, Eq)]
pub struct MetricDesc {
    /// Name without the `resque_` prefix.
    pub name: &'static str,
    pub help: &'static str,
    pub kind: MetricKind,
    pub labels: &'static [&'static str],
}

impl MetricDesc {
    /// Fully-qualified name, e.g. `resque_jobs_in_queue`.
    pub fn fq_name(&self) -> String {
        format!("{NAMESPACE}_{}", self.name)
    }
}

pub static JOB_EXECUTIONS: MetricDesc = MetricDesc {
    name: "job_executions_total",
    help: "Total number of job executions.",
    kind: MetricKind::Counter,
    labels: &[],
};

pub static FAILED_JOB_EXECUTIONS: MetricDesc = MetricDesc {
    name: "failed_job_executions_total",
    help: "Total number of failed job executions.",
    kind: MetricKind::Counter,
    labels: &[],
};

pub static JOBS_IN_QUEUE: MetricDesc = MetricDesc {
    name: "jobs_in_queue",
    help: "Number of jobs in a queue.",
    kind: MetricKind::Gauge,
    labels: &["queue"],
};

pub static JOBS_IN_FAILED_QUEUE: MetricDesc = MetricDesc {
    name: "jobs_in_failed_queue",
    help: "Number of jobs in a failed queue.",
    kind: MetricKind::Gauge,
    labels: &["queue"],
};

pub static WORKERS: MetricDesc = MetricDesc {
    name: "workers",
    help: "Number of workers.",
    kind: MetricKind::Gauge,
    labels: &[],
};

pub static WORKING_WORKERS: MetricDesc = MetricDesc {
    name: "working_workers",
    help: "Number of working workers.",
    kind: MetricKind::Gauge,
    labels: &[],
};

pub static SCRAPE_DURATION: MetricDesc = MetricDesc {
    name: "scrape_duration_seconds",
    help: "Time this scrape of resque metrics took.",
    kind: MetricKind::Gauge,
    labels: &[],
};

pub static UP: MetricDesc = MetricDesc {
    name: "up",
    help: "Whether this scrape of resque metrics was successful.",
    kind: MetricKind::Gauge,
    labels: &[],
};

pub static SCRAPES: MetricDesc = MetricDesc {
    name: "scrapes_total",
    help: "Total number of scrapes.",
    kind: MetricKind::Counter,
    labels: &[],
};

pub static FAILED_SCRAPES: MetricDesc = MetricDesc {
    name: "failed_scrapes_total",
    help: "Total number of failed scrapes.",
    kind: MetricKind::Counter,
    labels: &[],
};

/// One data point produced by a scrape.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub desc: &'static MetricDesc,
    pub value: f64,
    pub labels: BTreeMap<&'static str, String>,
}

impl Sample {
    pub fn new(desc: &'static MetricDesc, value: f64) -> Self {
        Self {
            desc,
            value,
            labels: BTreeMap::new(),
        }
    }

    /// Attach a label. Only names declared on the descriptor are meaningful.
    pub fn with_label(mut self, name: &'static str, value: impl Into<String>) -> Self {
        debug_assert!(self.desc.labels.contains(&name), "undeclared label {name}");
        self.labels.insert(name, value.into());
        self
    }

    pub fn name(&self) -> &'static str {
        self.desc.name
    }

    pub fn kind(&self) -> MetricKind {
        self.desc.kind
    }

    pub fn label(&self, name: &str) -> Option<&str> {
        self.labels.get(name).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fq_name_is_prefixed() {
        assert_eq!(JOBS_IN_QUEUE.fq_name(), "resque_jobs_in_queue");
        assert_eq!(SCRAPES.fq_name(), "resque_scrapes_total");
    }

    #[test]
    fn counters_end_in_total() {
        for desc in [&JOB_EXECUTIONS, &FAILED_JOB_EXECUTIONS, &SCRAPES, &FAILED_SCRAPES] {
            assert_eq!(desc.kind, MetricKind::Counter);
            assert!(desc.name.ends_with("_total"), "{}", desc.name);
        }
    }

    #[test]
    fn sample_labels() {
        let s = Sample::new(&JOBS_IN_QUEUE, 3.0).with_label("queue", "default");
        assert_eq!(s.name(), "jobs_in_queue");
        assert_eq!(s.kind(), MetricKind::Gauge);
        assert_eq!(s.label("queue"), Some("default"));
        assert_eq!(s.label("worker"), None);
    }
}
