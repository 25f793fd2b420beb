//! mlserve demo server - transcript threat analysis over HTTP

use serde_json::json;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod models;

use mlserve_core::{
    render_segment_table, InputTag, OutputTag, RouteSpec, Server, ServerConfig, TextResult,
    TypedInput, TypedOutput,
};
use models::ThreatScanner;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "mlserve_server=debug,mlserve_core=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting mlserve demo server");

    let config = ServerConfig::default();
    let mut server = Server::new(config.clone());

    let scanner = ThreatScanner::default();
    register_routes(&mut server, scanner)?;

    info!("Registered routes: {:?}", server.routes());

    let app = server.into_router();

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);

    let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());

    info!("Server ready. Press Ctrl+C to stop.");
    server.await?;

    Ok(())
}

fn register_routes(server: &mut Server, scanner: ThreatScanner) -> anyhow::Result<()> {
    let batch_scanner = scanner.clone();
    server.register(
        RouteSpec::new(
            "/transcript_threats",
            "transcript_threats",
            InputTag::BatchFile,
            OutputTag::BatchText,
        )
        .with_schema(json!({
            "inputs": [{
                "key": "transcript_files",
                "label": "Transcript Files",
                "subtitle": "Select the timestamped transcripts to analyze",
                "input_type": "BATCHFILE",
            }],
            "parameters": [],
        })),
        move |input| {
            let TypedInput::BatchFile(handles) = input else {
                anyhow::bail!("expected batch file input");
            };
            let mut results = Vec::with_capacity(handles.len());
            for handle in &handles {
                let flagged = batch_scanner.scan_transcript(&handle.path)?;
                results.push(TextResult {
                    title: Some(handle.path.display().to_string()),
                    value: render_segment_table("flagged segments", &flagged),
                });
            }
            Ok(TypedOutput::BatchText(results))
        },
    )?;

    server.register(
        RouteSpec::new(
            "/detect_threats",
            "detect_threats",
            InputTag::Text,
            OutputTag::Text,
        )
        .with_schema(json!({
            "inputs": [{
                "key": "text",
                "label": "Text",
                "subtitle": "Text to scan for threats",
                "input_type": "TEXT",
            }],
            "parameters": [],
        })),
        move |input| {
            let TypedInput::Text(text) = input else {
                anyhow::bail!("expected text input");
            };
            Ok(TypedOutput::Text(scanner.report(&text)))
        },
    )?;

    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down...");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down...");
        },
    }
}
