//! Request inspector.
//!
//! Serves every request through a [`RequestContext`] and answers with a JSON
//! report of what the context sees.
//!
//! ```text
//! curl -H 'X-Forwarded-For: 1.2.3.4' 'http://127.0.0.1:8080/users/7?tab=posts'
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    http::Request,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::any,
    Extension, Json, Router,
};
use clap::Parser;
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use request_context::config::{load_config, ContextConfig};
use request_context::observability::init_logging;
use request_context::{attach_binding, RequestContext, Values};

#[derive(Parser, Debug)]
#[command(name = "request-context", about = "Inspect inbound requests through RequestContext")]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on
    #[arg(short, long, default_value = "127.0.0.1:8080")]
    bind: String,
}

/// Time the request entered the middleware stack.
#[derive(Debug, Clone, Copy)]
struct ReceivedAt(Instant);

#[derive(Debug, Serialize)]
struct Report {
    method: String,
    url: String,
    client_ip: String,
    is_ajax: bool,
    wants_json: bool,
    wants_html: bool,
    wants_plain_text: bool,
    params: Values,
    query: Values,
    form: Values,
    body_bytes: Option<usize>,
    elapsed_micros: Option<u128>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => ContextConfig::default(),
    };
    init_logging(&config.logging)?;

    tracing::info!(
        config = ?args.config,
        real_ip_header = %config.client_ip.real_ip_header,
        body_limit = ?config.body.limit_bytes,
        "Configuration loaded"
    );

    let listener = TcpListener::bind(&args.bind).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let app = build_router(Arc::new(config));
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn build_router(config: Arc<ContextConfig>) -> Router {
    Router::new()
        .route("/inspect", any(inspect))
        .route("/users/{id}", any(inspect))
        .route("/orgs/{org}/repos/{repo}", any(inspect))
        .layer(middleware::from_fn(stamp))
        .layer(Extension(config))
        .layer(TraceLayer::new_for_http())
}

async fn stamp(mut req: Request<Body>, next: Next) -> Response {
    attach_binding(&mut req, ReceivedAt(Instant::now()));
    next.run(req).await
}

async fn inspect(mut ctx: RequestContext) -> Response {
    let form = ctx.form_values().await;
    let body_bytes = ctx.read_raw().await.ok().map(|b| b.len());

    let report = Report {
        method: ctx.method().to_string(),
        url: ctx.url(),
        client_ip: ctx.client_ip(),
        is_ajax: ctx.is_ajax(),
        wants_json: ctx.wants_json(),
        wants_html: ctx.wants_html(),
        wants_plain_text: ctx.wants_plain_text(),
        params: ctx.route_param_values(),
        query: ctx.query(),
        form,
        body_bytes,
        elapsed_micros: ctx.binding::<ReceivedAt>().map(|r| r.0.elapsed().as_micros()),
    };
    Json(report).into_response()
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
