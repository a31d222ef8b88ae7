use std::env;
use std::fs;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;

use catalog_lineage::config::{AppConfig, LogConfig};

const LOG_FILE_PREFIX: &str = "catalog_lineage.log";

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load configuration
    let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    let config = AppConfig::from_file(&config_path).map_err(std::io::Error::other)?;

    // Initialize logging; the guard must outlive the server so buffered file
    // output is flushed on shutdown.
    let _guard = init_logging(&config.logging).map_err(std::io::Error::other)?;

    tracing::info!("Loaded configuration from {}", config_path);

    // Create database pool with configured size
    let database_url = config.database_url();
    let pool_size = config.database.pool_size as u32;
    let pool =
        catalog_lineage::db::create_pool(&database_url, pool_size).map_err(std::io::Error::other)?;

    tracing::info!(
        "Database connection pool created with max_size={}",
        pool_size
    );

    // Note: Diesel migrations should be run manually using diesel CLI:
    // diesel migration run
    // Start server with configured workers
    catalog_lineage::server::start_server(
        &config.server.host,
        config.server.port,
        config.server.worker_threads,
        pool,
    )
    .await
}

fn init_logging(config: &LogConfig) -> anyhow::Result<WorkerGuard> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    // Create log directory if it doesn't exist
    fs::create_dir_all(&config.log_dir)?;
    // Clean up old log files
    cleanup_old_logs(&config.log_dir, config.max_log_files)?;

    let file_appender = tracing_appender::rolling::daily(&config.log_dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // Parse log level
    let log_level = config
        .log_level
        .parse::<tracing::Level>()
        .unwrap_or(tracing::Level::INFO);

    // Build the subscriber with both stdout and file output
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stdout))
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(guard)
}

/// Remove dated log files beyond the retention limit, oldest first.
fn cleanup_old_logs(log_dir: &str, max_files: usize) -> anyhow::Result<()> {
    let log_path = Path::new(log_dir);
    if !log_path.exists() {
        return Ok(());
    }

    let mut log_files: Vec<_> = fs::read_dir(log_path)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry
                .path()
                .file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.starts_with(LOG_FILE_PREFIX))
                .unwrap_or(false)
        })
        .filter_map(|entry| {
            let metadata = entry.metadata().ok()?;
            let modified = metadata.modified().ok()?;
            Some((entry.path(), modified))
        })
        .collect();

    // Sort by modification time (newest first)
    log_files.sort_by(|a, b| b.1.cmp(&a.1));

    // Remove files beyond max_files limit
    for (path, _) in log_files.iter().skip(max_files) {
        if let Err(e) = fs::remove_file(path) {
            eprintln!("Failed to remove old log file {:?}: {}", path, e);
        }
    }

    Ok(())
}
