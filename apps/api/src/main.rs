mod agents;
mod config;
mod db;
mod decision;
mod errors;
mod evaluation;
mod hiring;
mod llm_client;
mod models;
mod routes;
mod session;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::agents::{LlmNegotiator, LlmOnboardingPlanner, RaterPanel};
use crate::config::Config;
use crate::db::create_pool;
use crate::decision::critical::KeywordCriticalPolicy;
use crate::hiring::pipeline::{CollaboratorTimeouts, HiringPipeline};
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::session::pg_repository::PgSessionRepository;
use crate::session::repository::{MemorySessionRepository, SessionRepository};
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting HireFlow API v{}", env!("CARGO_PKG_VERSION"));

    // Session storage: Postgres when configured, in-memory otherwise
    let sessions: Arc<dyn SessionRepository> = match &config.database_url {
        Some(url) => {
            let repo = PgSessionRepository::new(create_pool(url).await?);
            repo.ensure_schema()
                .await
                .context("Failed to prepare session schema")?;
            info!("Session repository: PostgreSQL");
            Arc::new(repo)
        }
        None => {
            info!("Session repository: in-memory (DATABASE_URL not set)");
            Arc::new(MemorySessionRepository::new())
        }
    };

    // Initialize LLM client and agents
    let llm = LlmClient::new(config.anthropic_api_key.clone())
        .context("Failed to build LLM client")?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    let critical_policy = KeywordCriticalPolicy::new(&config.critical_flag_keywords);
    let timeouts = CollaboratorTimeouts {
        rater: config.rater_timeout,
        negotiation: config.negotiation_timeout,
    };
    info!(
        "Collaborator timeouts: rater {:?}, negotiation {:?}",
        timeouts.rater, timeouts.negotiation
    );

    let pipeline = HiringPipeline::new(
        sessions,
        RaterPanel::llm(&llm),
        Arc::new(LlmNegotiator::new(llm.clone())),
        Arc::new(LlmOnboardingPlanner::new(llm)),
        Arc::new(critical_policy),
        timeouts,
    );

    let state = AppState {
        pipeline: Arc::new(pipeline),
    };

    // Build router
    let app = build_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()), // TODO: restrict CORS origins once the front-end host is fixed
    );

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
