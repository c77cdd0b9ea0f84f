use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use corkboard_api::storage::Storage;
use corkboard_api::{AppStateInner, cleanup, router};
use corkboard_db::Database;

/// Placeholder admin passwords that MUST NOT be used.
const PLACEHOLDER_PASSWORDS: &[&str] = &[
    "your_secret_password",
    "change-me",
];

/// Sweep the upload directory once an hour.
const CLEANUP_INTERVAL_SECS: u64 = 3600;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "corkboard_server=debug,corkboard_api=debug,corkboard_db=debug,tower_http=debug"
                    .into()
            }),
        )
        .init();

    // Config
    let admin_password = std::env::var("BOARD_ADMIN_PASSWORD").unwrap_or_default();
    if admin_password.is_empty() || PLACEHOLDER_PASSWORDS.contains(&admin_password.as_str()) {
        eprintln!("FATAL: BOARD_ADMIN_PASSWORD is unset or still a placeholder.");
        eprintln!("       It guards clear-messages and set-topic.");
        eprintln!("       Set it in your .env file and restart.");
        std::process::exit(1);
    }

    let host = std::env::var("BOARD_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("BOARD_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;
    let db_path = std::env::var("BOARD_DB_PATH").unwrap_or_else(|_| "corkboard.db".into());
    let public_dir: PathBuf = std::env::var("BOARD_PUBLIC_DIR")
        .unwrap_or_else(|_| "./public".into())
        .into();
    let retention_hours: u64 = std::env::var("BOARD_RETENTION_HOURS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(24);

    // Init database; ":memory:" selects the transient store
    let db = if db_path == ":memory:" {
        Database::open_in_memory()?
    } else {
        Database::open(&PathBuf::from(&db_path))?
    };

    // Blocklist words passed via the environment, comma separated
    if let Ok(words) = std::env::var("BOARD_BLOCKLIST") {
        let mut seeded = 0;
        for word in words.split(',').map(str::trim).filter(|w| !w.is_empty()) {
            if db.add_blocked_word(word)? {
                seeded += 1;
            }
        }
        if seeded > 0 {
            info!("Seeded {} blocklist words", seeded);
        }
    }

    let storage = Storage::new(public_dir.clone()).await?;

    let state = Arc::new(AppStateInner {
        db,
        storage,
        admin_password,
    });

    // Background cleanup task (runs every hour)
    tokio::spawn(cleanup::run_cleanup_loop(
        state.clone(),
        retention_hours,
        CLEANUP_INTERVAL_SECS,
    ));

    // Uploads land in the public dir, so the static fallback serves them
    // as soon as they are stored
    let app = router(state)
        .fallback_service(ServeDir::new(&public_dir))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Corkboard server listening on {}", addr);
    info!("Upload retention: {} hours", retention_hours);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
