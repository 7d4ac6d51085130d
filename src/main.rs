use clap::Parser;
use nightpass::{
    args::Args,
    errors::{AppError, AppResult},
    http_server, Config, DbPersistence,
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> AppResult<()> {
    let args = Args::parse();

    // Load configuration from --config path (defaults to config/default.toml)
    let mut config = Config::load(&args.config).map_err(AppError::Config)?;

    // Apply CLI overrides
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(bot_token) = args.bot_token {
        config.telegram.bot_token = bot_token;
    }

    // Initialize logging
    init_logging(&config.logging.level)?;

    info!("🚀 Starting NightPass v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration loaded from: {}", args.config);

    if config.get_bot_token().is_empty() {
        warn!("Telegram bot token is not set, WebApp logins will be rejected");
    }
    if config.qr.secret.as_deref().unwrap_or_default().is_empty() {
        warn!("QR secret is not set, falling back to the JWT secret");
    }

    // Initialize database persistence (runs pending migrations)
    let db = Arc::new(DbPersistence::new(config.get_database_url()).await?);
    info!("Database ready");

    if args.migrate_only {
        info!("Migrations applied, exiting");
        return Ok(());
    }

    let server_address = config.get_server_address();
    info!("HTTP API available at: http://{}", server_address);

    http_server::start_server(db, &server_address, Arc::new(config))
        .await
        .map_err(|e| AppError::Server(e.to_string()))?;

    Ok(())
}

fn init_logging(level: &str) -> AppResult<()> {
    let log_level = match level.to_lowercase().as_str() {
        "error" => tracing::Level::ERROR,
        "warn" => tracing::Level::WARN,
        "info" => tracing::Level::INFO,
        "debug" => tracing::Level::DEBUG,
        "trace" => tracing::Level::TRACE,
        _ => {
            eprintln!("Invalid log level: {}, defaulting to info", level);
            tracing::Level::INFO
        }
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("nightpass={},tower_http={}", log_level, log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    Ok(())
}
