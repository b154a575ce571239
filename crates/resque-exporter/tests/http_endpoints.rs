//! Router-level tests: drive the exporter's HTTP surface against an
//! in-memory Resque backend.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use resque_backend::{KeyNamespace, MemoryBackend};
use resque_exporter::{build_router, VERSION};
use resque_metrics::Collector;

fn test_collector() -> Arc<Collector<MemoryBackend>> {
    let backend = MemoryBackend::new();
    backend
        .set("resque:stat:processed", "42")
        .set("resque:stat:failed", "1")
        .sadd("resque:queues", &["default"])
        .push("resque:queue:default", &["j1", "j2", "j3"])
        .sadd("resque:workers", &["w1"]);
    Arc::new(Collector::new(backend, KeyNamespace::default()))
}

async fn get(router: Router, uri: &str) -> (StatusCode, String) {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let resp = router.oneshot(req).await.unwrap();
    let status = resp.status();
    let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

fn has_line(body: &str, line: &str) -> bool {
    body.lines().any(|l| l == line)
}

#[tokio::test]
async fn metrics_endpoint_serves_scrape() {
    let router = build_router(test_collector(), "/metrics");
    let (status, body) = get(router, "/metrics").await;

    assert_eq!(status, StatusCode::OK);
    assert!(has_line(&body, "resque_job_executions_total 42"));
    assert!(has_line(&body, "resque_jobs_in_queue{queue=\"default\"} 3"));
    assert!(has_line(&body, "resque_workers 1"));
    assert!(has_line(&body, "resque_working_workers 0"));
    assert!(has_line(&body, "resque_up 1"));
    assert!(has_line(&body, "resque_scrapes_total 1"));
    assert!(has_line(
        &body,
        &format!("resque_exporter_build_info{{version=\"{VERSION}\"}} 1")
    ));
}

#[tokio::test]
async fn each_request_is_one_scrape() {
    let collector = test_collector();
    let router = build_router(Arc::clone(&collector), "/metrics");

    get(router.clone(), "/metrics").await;
    let (_, body) = get(router, "/metrics").await;

    assert!(has_line(&body, "resque_scrapes_total 2"));
    assert_eq!(collector.scrapes_total(), 2);
}

#[tokio::test]
async fn backend_outage_still_returns_200() {
    let collector = test_collector();
    collector.backend().set_offline(true);
    let router = build_router(Arc::clone(&collector), "/metrics");

    let (status, body) = get(router, "/metrics").await;

    assert_eq!(status, StatusCode::OK);
    assert!(has_line(&body, "resque_up 0"));
    assert!(has_line(&body, "resque_failed_scrapes_total 1"));
    assert!(has_line(&body, "resque_scrapes_total 1"));
    assert!(body.contains("resque_scrape_duration_seconds "));
    assert!(!body.contains("resque_jobs_in_queue"));
}

#[tokio::test]
async fn custom_telemetry_path() {
    let router = build_router(test_collector(), "/resque/metrics");

    let (status, body) = get(router.clone(), "/resque/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert!(has_line(&body, "resque_up 1"));

    let (status, _) = get(router.clone(), "/metrics").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = get(router, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("<a href='/resque/metrics'>Metrics</a>"));
}

#[tokio::test]
async fn landing_page_does_not_scrape() {
    let collector = test_collector();
    let router = build_router(Arc::clone(&collector), "/metrics");

    let (status, body) = get(router, "/").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("<h1>Resque Exporter</h1>"));
    assert_eq!(collector.scrapes_total(), 0);
}
