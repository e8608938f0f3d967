// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use anyhow::{Context as _, Result};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use clap::Parser;
use kube::Client;
use std::net::SocketAddr;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use traefik2dns::{
    config::ControllerConfig, context::Context, metrics::gather_metrics,
    watcher::run_route_watcher,
};

fn main() -> Result<()> {
    let config = ControllerConfig::parse();

    // Build Tokio runtime with custom thread names
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("traefik2dns")
        .enable_all()
        .build()?;

    runtime.block_on(async_main(config))
}

async fn async_main(config: ControllerConfig) -> Result<()> {
    // Respects RUST_LOG environment variable if set, otherwise defaults to INFO level
    // Respects RUST_LOG_FORMAT environment variable for output format (json or text)
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let log_format = std::env::var("RUST_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .with_ansi(true)
                .compact()
                .init();
        }
    }

    // kube's rustls client needs a process-wide crypto provider
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        debug!("rustls crypto provider already installed");
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        selector = %config.traefik_label,
        namespace = %config.traefik_namespace,
        "Starting traefik2dns controller"
    );

    debug!("Initializing Kubernetes client");
    let client = Client::try_default().await?;
    debug!("Kubernetes client initialized successfully");

    let ctx = Context::initialize(client, config)
        .await
        .context("Unable to determine Traefik load balancer addresses")?;

    let listener = tokio::net::TcpListener::bind(ctx.config.metrics_bind_address)
        .await
        .with_context(|| {
            format!(
                "Unable to bind metrics server to {}",
                ctx.config.metrics_bind_address
            )
        })?;
    let http_server = tokio::spawn(serve_http(listener, ctx.config.metrics_bind_address));

    let (tx, rx) = mpsc::channel(ctx.config.event_buffer.get());
    let route_watcher = tokio::spawn(run_route_watcher(ctx.client.clone(), tx));

    let reconciler = ctx.record_reconciler();
    let handled = reconciler.run(rx, shutdown_signal()).await;

    route_watcher.abort();
    http_server.abort();
    info!(handled = handled, "traefik2dns stopped");

    Ok(())
}

/// Serve `/metrics` and `/healthz` until the task is aborted.
async fn serve_http(listener: tokio::net::TcpListener, addr: SocketAddr) {
    info!(address = %addr, "Serving metrics and health endpoints");

    if let Err(e) = axum::serve(listener, router()).await {
        error!(error = %e, "Metrics server stopped");
    }
}

fn router() -> Router {
    Router::new()
        .route("/metrics", get(serve_metrics))
        .route("/healthz", get(health_check))
}

async fn serve_metrics() -> Response {
    match gather_metrics() {
        Ok(body) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

async fn health_check() -> &'static str {
    "OK"
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Unable to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Unable to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received SIGINT (Ctrl+C), shutting down gracefully"),
        () = terminate => info!("Received SIGTERM, shutting down gracefully"),
    }
}
