//! HTTP surface: the telemetry endpoint and a landing page.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse};
use axum::routing::get;
use axum::Router;
use tracing::debug;

use resque_backend::QueueBackend;
use resque_metrics::{render_prometheus, Collector, MetricDesc, MetricKind, Sample, CONTENT_TYPE};

static BUILD_INFO: MetricDesc = MetricDesc {
    name: "exporter_build_info",
    help: "A metric with a constant '1' value labeled by the resque_exporter version.",
    kind: MetricKind::Gauge,
    labels: &["version"],
};

/// Shared state for the HTTP handlers.
pub struct ExporterState<B> {
    pub collector: Arc<Collector<B>>,
    pub telemetry_path: Arc<str>,
}

impl<B> Clone for ExporterState<B> {
    fn clone(&self) -> Self {
        Self {
            collector: Arc::clone(&self.collector),
            telemetry_path: Arc::clone(&self.telemetry_path),
        }
    }
}

/// Build the exporter router.
///
/// `telemetry_path` must already be validated (absolute, not `/`).
pub fn build_router<B: QueueBackend>(collector: Arc<Collector<B>>, telemetry_path: &str) -> Router {
    let state = ExporterState {
        collector,
        telemetry_path: Arc::from(telemetry_path),
    };

    Router::new()
        .route(telemetry_path, get(metrics::<B>))
        .route("/", get(landing_page::<B>))
        .with_state(state)
}

/// Run one scrape and render it.
pub async fn metrics<B: QueueBackend>(State(state): State<ExporterState<B>>) -> impl IntoResponse {
    let outcome = state.collector.collect().await;
    debug!(up = outcome.is_up(), "serving scrape");

    let mut samples = outcome.samples;
    samples.push(Sample::new(&BUILD_INFO, 1.0).with_label("version", crate::VERSION));

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, CONTENT_TYPE)],
        render_prometheus(&samples),
    )
}

pub async fn landing_page<B: QueueBackend>(State(state): State<ExporterState<B>>) -> Html<String> {
    Html(format!(
        "<html>\n\
         <head><title>Resque Exporter</title></head>\n\
         <body>\n\
         <h1>Resque Exporter</h1>\n\
         <p><a href='{path}'>Metrics</a></p>\n\
         </body>\n\
         </html>\n",
        path = state.telemetry_path
    ))
}
