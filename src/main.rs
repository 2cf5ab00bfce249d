//! Demo binary: a small API with the full governance stack mounted.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, Json, Router};
use serde_json::json;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use api_governance::monitor::AlwaysUpProbe;
use api_governance::observability::{logging, metrics};
use api_governance::{http, load_config, GovernanceConfig, Governor, Shutdown};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = match std::env::args().nth(1) {
        Some(path) => load_config(&PathBuf::from(path))?,
        None => GovernanceConfig::default(),
    };
    logging::init(&config.observability.log_filter);

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_exporter(addr);
    }

    let shutdown = Shutdown::new();
    let governor = Arc::new(Governor::new(config, Arc::new(AlwaysUpProbe)));
    governor.start(&shutdown);

    let api = Router::new()
        .route("/api/users", get(list_users))
        .route("/api/users/{id}", get(get_user));
    let app = http::apply_governance(api, &governor)
        .merge(http::admin_router(governor.clone()))
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));

    let addr: SocketAddr = governor.config.listener.bind_address.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(address = %addr, "listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("shutdown signal received");
        shutdown.trigger();
    })
    .await?;

    Ok(())
}

async fn list_users() -> Json<serde_json::Value> {
    Json(json!([
        { "id": 1, "name": "alice" },
        { "id": 2, "name": "bob" },
    ]))
}

async fn get_user(axum::extract::Path(id): axum::extract::Path<u64>) -> Json<serde_json::Value> {
    Json(json!({ "id": id, "name": format!("user-{id}") }))
}
