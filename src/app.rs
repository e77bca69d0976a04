use std::net::SocketAddr;

use axum::{middleware::from_fn_with_state, routing::get, Json, Router};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use crate::accounts;
use crate::error::AccountError;
use crate::security::{apply_security_headers, cors_layer};
use crate::state::AppState;

pub fn build_app(state: AppState) -> Router {
    let security = state.config.security.clone();
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .merge(accounts::router())
        .fallback(not_found)
        .with_state(state)
        .layer(cors_layer(&security))
        .layer(from_fn_with_state(security.clone(), apply_security_headers))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri, status = tracing::field::Empty)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     _latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, "response");
                        } else {
                            tracing::info!(%status, "response");
                        }
                    },
                ),
        )
}

async fn index() -> Json<Value> {
    Json(json!({
        "name": "Account REST API Service",
        "version": "1.0",
        "paths": "/accounts",
    }))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "OK" }))
}

async fn not_found() -> AccountError {
    AccountError::RouteNotFound
}

pub async fn serve(app: Router) -> anyhow::Result<()> {
    let addr: SocketAddr = format!(
        "{}:{}",
        std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
        std::env::var("APP_PORT").unwrap_or_else(|_| "8080".into())
    )
    .parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
