use axum::routing::post;
use axum::{Json, Router};
use openapi_validator::{Options, Settings, Validator};
use serde_json::{json, Value};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";

/// Echo handler for the demo `POST /test` operation.
async fn test_handler(Json(payload): Json<Value>) -> Json<Value> {
    let name = payload
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or_default();
    Json(json!({ "result": format!("hello, {}", name) }))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
    }
}

async fn run(spec_path: String, settings_path: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let settings = match settings_path {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    let validator = Validator::with_options(&spec_path, Options::from(settings))?;

    let app = Router::new()
        .route("/test", post(test_handler))
        .layer(validator.layer())
        .merge(validator.docs_router());

    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(
        addr = %addr,
        spec = %spec_path,
        docs = %validator.options().docs_path(),
        "listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let Some(spec_path) = args.next() else {
        eprintln!("usage: openapi-validator <spec.yaml|spec.json> [settings.yaml]");
        return ExitCode::from(2);
    };

    match run(spec_path, args.next()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "server failed");
            ExitCode::FAILURE
        }
    }
}
