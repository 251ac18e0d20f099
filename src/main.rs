//! AugmentFlow API - Augmentation Policy Governance
//!
//! Serves the governance core over HTTP: domain-safe enforcement of
//! augmentation policies, policy versioning, and analysis endpoints.

use augmentflow::config::Settings;
use augmentflow::context::GovernanceContext;
use augmentflow::routes::create_router;
use augmentflow::state::AppState;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber for structured logging
    init_tracing();

    info!("🚀 Starting AugmentFlow - Augmentation Policy Governance...");

    // Load configuration
    let settings = Settings::load()?;
    info!("📋 Configuration loaded successfully");

    // Schema registry and domain rules are built once and read-only afterwards
    let context = GovernanceContext::init(&settings.governance).map_err(|e| {
        error!("❌ FATAL: Failed to initialize governance context: {}", e);
        e
    })?;
    let state = Arc::new(AppState::new(context, &settings.governance));

    // Build the router
    let app = create_router(state, &settings);

    // Create socket address
    let addr = SocketAddr::from((settings.server.host, settings.server.port));

    info!("🌐 Server listening on http://{}", addr);
    info!("");
    info!("📚 API Endpoints:");
    info!("   ─── Catalog & Domains ───");
    info!("   GET  /api/transforms                 - Transform catalog");
    info!("   GET  /api/domains                    - List domains");
    info!("   GET  /api/domains/{{name}}             - Domain constraints");
    info!("   POST /api/domains/{{name}}/check       - Quick check a transform");
    info!("");
    info!("   ─── Policies ───");
    info!("   POST /api/policies/enforce           - Enforce domain rules");
    info!("   POST /api/policies/validate          - Audit a policy");
    info!("   POST /api/policies                   - Enforce and commit a version");
    info!("   GET  /api/policies/{{name}}/diff       - Diff two versions");
    info!("");
    info!("   ─── Analysis ───");
    info!("   POST /api/ablation                   - Leave-one-out ablation");
    info!("   POST /api/curriculum                 - Curriculum stages");
    info!("   POST /api/shift                      - Shift estimate");
    info!("");

    // Create TCP listener and serve
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("👋 Server shutdown complete");
    Ok(())
}

/// Initialize tracing with structured logging
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,augmentflow=debug,tower_http=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .compact(),
        )
        .init();
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
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
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("📴 Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            info!("📴 Received terminate signal, initiating graceful shutdown...");
        },
    }
}
