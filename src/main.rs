use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use luckydraw::config::{AppConfig, Mode};
use luckydraw::mailbox::{FileMailbox, HttpMailbox, Mailbox, HTTP_TIMEOUT};
use luckydraw::{api, display, state::AppState, ws};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present (before any env var reads)
    if let Err(e) = dotenvy::dotenv() {
        // Not an error if .env doesn't exist, only log if it's a different issue
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "luckydraw=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env();

    match config.mode {
        Mode::Display => {
            tracing::info!("Starting lucky draw display...");
            display::run(&config).await?;
        }
        Mode::Server => {
            tracing::info!("Starting lucky draw server...");
            serve(&config).await?;
        }
    }

    Ok(())
}

async fn serve(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mailbox: Arc<dyn Mailbox> = match &config.mailbox_url {
        Some(url) => {
            let remote = HttpMailbox::new(url, HTTP_TIMEOUT)?;
            tracing::info!("Mailbox relayed to {}", remote.url());
            Arc::new(remote)
        }
        None => {
            let file = FileMailbox::new(config.mailbox_path.clone());
            tracing::info!("Mailbox file: {}", file.path().display());
            Arc::new(file)
        }
    };

    let state = Arc::new(AppState::with_mailbox(mailbox, config.max_replicated_pool));

    if config.mock_pool {
        let count = state.load_mock_pool().await?;
        tracing::info!("Demo pool loaded with {} participants", count);
    }

    let app = Router::new()
        .route("/ws", get(ws::ws_handler))
        .merge(api::routes())
        .fallback_service(ServeDir::new(&config.static_dir))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
