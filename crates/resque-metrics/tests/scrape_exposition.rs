//! End-to-end: in-memory Resque state → collector → Prometheus text.

use resque_backend::{KeyNamespace, MemoryBackend};
use resque_metrics::{render_prometheus, Collector};

fn populated_backend() -> MemoryBackend {
    let backend = MemoryBackend::new();
    backend
        .set("resque:stat:processed", "42")
        .set("resque:stat:failed", "1")
        .sadd("resque:queues", &["default"])
        .push("resque:queue:default", &["j1", "j2", "j3"])
        .sadd("resque:workers", &["w1"]);
    backend
}

#[tokio::test]
async fn healthy_scrape_renders_every_family() {
    let collector = Collector::new(populated_backend(), KeyNamespace::default());
    let text = render_prometheus(&collector.collect().await.samples);

    for line in [
        "resque_job_executions_total 42",
        "resque_failed_job_executions_total 1",
        "resque_jobs_in_queue{queue=\"default\"} 3",
        "resque_workers 1",
        "resque_working_workers 0",
        "resque_up 1",
        "resque_failed_scrapes_total 0",
        "resque_scrapes_total 1",
    ] {
        assert!(text.lines().any(|l| l == line), "missing {line:?} in:\n{text}");
    }
    assert!(text.contains("# TYPE resque_scrape_duration_seconds gauge"));
    assert!(!text.contains("resque_jobs_in_failed_queue"));
}

#[tokio::test]
async fn failed_scrape_still_renders_status_families() {
    let backend = populated_backend();
    backend.set_offline(true);
    let collector = Collector::new(backend, KeyNamespace::default());

    collector.collect().await;
    let text = render_prometheus(&collector.collect().await.samples);

    assert!(text.lines().any(|l| l == "resque_up 0"));
    assert!(text.lines().any(|l| l == "resque_failed_scrapes_total 2"));
    assert!(text.lines().any(|l| l == "resque_scrapes_total 2"));
    assert!(text.contains("resque_scrape_duration_seconds "));
    assert!(!text.contains("resque_jobs_in_queue"));
    assert!(!text.contains("resque_workers"));
}

#[tokio::test]
async fn legacy_failed_queue_exposed() {
    let backend = populated_backend();
    backend.push("resque:failed", &["f1", "f2"]);
    let collector = Collector::new(backend, KeyNamespace::default());
    let text = render_prometheus(&collector.collect().await.samples);

    assert!(text
        .lines()
        .any(|l| l == "resque_jobs_in_failed_queue{queue=\"failed\"} 2"));
}
