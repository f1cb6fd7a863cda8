use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;

use voice_task_gateway::application::services::{BackendSessionCell, TranscriptionService};
use voice_task_gateway::infrastructure::agent::{AgentProvider, TaskAgentFactory};
use voice_task_gateway::infrastructure::asr::DashScopeClient;
use voice_task_gateway::infrastructure::observability::{TracingConfig, init_tracing};
use voice_task_gateway::presentation::config::DEFAULT_CONFIG_FILE;
use voice_task_gateway::presentation::{AppState, Settings, create_router};

#[derive(Debug, Parser)]
#[command(name = "voice-task-gateway")]
#[command(about = "HTTP gateway that forwards written or spoken tasks to the phone agent")]
#[command(version)]
struct Cli {
    /// Host to bind the HTTP server to
    #[arg(long)]
    host: Option<String>,

    /// Port to bind the HTTP server to
    #[arg(long)]
    port: Option<u16>,

    /// Settings file (JSON, TOML or YAML)
    #[arg(long, env = "APP_CONFIG_FILE", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let mut settings = Settings::load(Some(cli.config.as_path())).context("failed to load settings")?;
    if let Some(host) = cli.host {
        settings.http.host = host;
    }
    if let Some(port) = cli.port {
        settings.http.port = port;
    }

    let listener = TcpListener::bind((settings.http.host.as_str(), settings.http.port))
        .await
        .with_context(|| {
            format!(
                "failed to bind {}:{}",
                settings.http.host, settings.http.port
            )
        })?;
    let addr: SocketAddr = listener.local_addr()?;

    init_tracing(&TracingConfig::new(settings.environment, &settings.logging), addr);

    if settings.asr.api_key.is_empty() {
        tracing::warn!("DASHSCOPE_API_KEY is not set; /asr requests will be rejected by the provider");
    }

    let provider = DashScopeClient::new(
        settings.asr.api_key.clone(),
        Some(settings.asr.base_url.clone()),
    )
    .with_models(&settings.asr.url_model, &settings.asr.file_model);
    let transcription_service = Arc::new(TranscriptionService::new(
        Arc::new(provider),
        settings.asr.timeout(),
    ));

    let agent_provider = if settings.scaffold.enabled {
        tracing::info!("Scaffold mode: tasks are echoed instead of executed");
        AgentProvider::Echo {
            delay_ms: settings.scaffold.mock_response_delay_ms,
        }
    } else {
        AgentProvider::Http
    };
    let backend = Arc::new(BackendSessionCell::from_env(Arc::new(
        TaskAgentFactory::new(agent_provider),
    )));

    let state = AppState {
        transcription_service,
        backend,
        settings,
    };
    let router = create_router(state);

    tracing::info!("Listening on http://{}", addr);
    tracing::info!("  POST /task  {{\"task\": \"...\"}}");
    tracing::info!("  GET  /task/<task> or /task?task=<task>");
    tracing::info!("  POST /asr   {{\"audio_url\": \"...\"}} or {{\"audio_base64\": \"...\", \"audio_format\": \"wav\"}}");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutting down server...");
}
