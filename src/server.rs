//! HTTP exposition: the telemetry endpoint and a landing page.

use crate::config::ExporterConfig;
use crate::error::Result;
use crate::exporter::{build_info, Exporter, BUILD_INFO};
use crate::metrics::{encode_text, exposition::CONTENT_TYPE};
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse};
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;

#[derive(Clone)]
pub struct AppState {
    exporter: Arc<Exporter>,
    telemetry_path: Arc<str>,
}

pub fn router(exporter: Arc<Exporter>, telemetry_path: &str) -> Router {
    let state = AppState {
        exporter,
        telemetry_path: Arc::from(telemetry_path),
    };
    Router::new()
        .route("/", get(landing_handler))
        .route(telemetry_path, get(metrics_handler))
        .with_state(state)
}

pub async fn serve(config: &ExporterConfig, exporter: Arc<Exporter>) -> Result<()> {
    let app = router(exporter, &config.telemetry_path);
    let listener = TcpListener::bind(&config.listen_address).await?;
    log::info!(
        "Listening on {} (metrics at {})",
        config.listen_address,
        config.telemetry_path
    );

    axum::serve(listener, app).await?;
    Ok(())
}

/// Renders a full scrape, followed by the exporter's own build info.
pub async fn render(exporter: &Exporter) -> Result<String> {
    let mut samples = exporter.collect().await;
    samples.push(build_info());

    let mut descriptors = exporter.descriptors();
    descriptors.push(&BUILD_INFO);
    encode_text(&descriptors, samples)
}

async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    match render(&state.exporter).await {
        Ok(body) => ([(header::CONTENT_TYPE, CONTENT_TYPE)], body).into_response(),
        Err(e) => {
            log::error!("Error encoding metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

async fn landing_handler(State(state): State<AppState>) -> impl IntoResponse {
    Html(format!(
        "<html>\n\
         <head><title>ibmslapd exporter</title></head>\n\
         <body>\n\
         <h1>ibmslapd exporter</h1>\n\
         <p>Prometheus exporter for IBM Security Verify Directory metrics</p>\n\
         <p>Version {}</p>\n\
         <ul><li><a href=\"{}\">Metrics</a></li></ul>\n\
         </body>\n\
         </html>\n",
        env!("CARGO_PKG_VERSION"),
        state.telemetry_path
    ))
}
