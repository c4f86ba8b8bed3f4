use crate::library::{EntityKind, LibraryStore};
use anyhow::{Context, Result};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use lazy_static::lazy_static;
use prometheus::core::Collector;
use prometheus::{
    CounterVec, Encoder, GaugeVec, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};
use std::time::Duration;
use tracing::{debug, error, info, warn};

const PREFIX: &str = "home_library";

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    pub static ref HTTP_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_http_requests_total"), "HTTP requests served, by route and status"),
        &["method", "route", "status"]
    ).expect("invalid http_requests_total definition");

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            format!("{PREFIX}_http_request_duration_seconds"),
            "Time spent serving a request, in seconds"
        )
        .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]),
        &["method", "route"]
    ).expect("invalid http_request_duration_seconds definition");

    pub static ref LIBRARY_ITEMS_TOTAL: GaugeVec = GaugeVec::new(
        Opts::new(format!("{PREFIX}_library_items_total"), "Records currently stored, by kind"),
        &["kind"]
    ).expect("invalid library_items_total definition");

    pub static ref CASCADE_FIXUPS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(
            format!("{PREFIX}_cascade_fixups_total"),
            "References cleared by cascade deletes"
        ),
        &["kind"]
    ).expect("invalid cascade_fixups_total definition");
}

/// Registers every collector with `REGISTRY`. Calling it again is harmless.
pub fn init_metrics() {
    let collectors: [Box<dyn Collector>; 4] = [
        Box::new(HTTP_REQUESTS_TOTAL.clone()),
        Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()),
        Box::new(LIBRARY_ITEMS_TOTAL.clone()),
        Box::new(CASCADE_FIXUPS_TOTAL.clone()),
    ];
    for collector in collectors {
        if let Err(err) = REGISTRY.register(collector) {
            debug!("Metric not registered: {}", err);
        }
    }
    info!("Metrics registered");
}

pub fn record_http_request(method: &str, route: &str, status: u16, elapsed: Duration) {
    let status = status.to_string();
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, route, status.as_str()])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, route])
        .observe(elapsed.as_secs_f64());
}

/// Refresh the item gauge of one kind from the store.
pub fn refresh_library_items(library: &dyn LibraryStore, kind: EntityKind) {
    match library.count(kind) {
        Ok(count) => LIBRARY_ITEMS_TOTAL
            .with_label_values(&[kind.to_db_str()])
            .set(count as f64),
        Err(err) => warn!("Could not count {} records: {}", kind, err),
    }
}

pub fn refresh_all_library_items(library: &dyn LibraryStore) {
    for kind in EntityKind::ALL {
        refresh_library_items(library, kind);
    }
}

pub fn record_cascade_fixups(kind: EntityKind, fixups: usize) {
    CASCADE_FIXUPS_TOTAL
        .with_label_values(&[kind.to_db_str()])
        .inc_by(fixups as f64);
}

async fn metrics_handler() -> Response {
    let mut buffer = Vec::new();
    match TextEncoder::new().encode(&REGISTRY.gather(), &mut buffer) {
        Ok(()) => String::from_utf8_lossy(&buffer).into_owned().into_response(),
        Err(err) => {
            error!("Could not encode metrics: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Serves `/metrics` on its own port, apart from the API.
pub async fn run_metrics_server(port: u16) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("Could not bind metrics port {}", port))?;
    let app = Router::new().route("/metrics", get(metrics_handler));
    axum::serve(listener, app).await?;
    Ok(())
}
