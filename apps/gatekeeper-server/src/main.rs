use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use db::{ConnectOpts, DbHandle};
use mimalloc::MiMalloc;
use runtime::{AppConfig, DatabaseConfig};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use access_requests::config::AccessRequestsConfig;
use access_requests::infra::legacy::LegacyLists;
use access_requests::AccessRequests;

mod http;

const MODULE_NAME: &str = "access_requests";

/// Expand a sqlite DSN into an absolute-path DSN using a base directory.
/// - Keeps "sqlite::memory:" as-is.
/// - Normalizes backslashes into forward slashes (important on Windows).
fn absolutize_sqlite_dsn(dsn: &str, base_dir: &Path, create_dirs: bool) -> Result<String> {
    if dsn.eq_ignore_ascii_case("sqlite::memory:") || dsn.eq_ignore_ascii_case("sqlite://:memory:")
    {
        return Ok("sqlite::memory:".to_string());
    }
    let db_path = dsn
        .strip_prefix("sqlite://")
        .ok_or_else(|| anyhow!("DSN must start with sqlite:// (got: {})", dsn))?;

    let (path_str, query) = match db_path.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (db_path, None),
    };

    let mut p = PathBuf::from(path_str);
    if p.as_os_str().is_empty() {
        return Err(anyhow!("Empty SQLite path in DSN"));
    }
    if p.is_relative() {
        p = base_dir.join(p);
    }

    if let Some(dir) = p.parent() {
        if create_dirs {
            std::fs::create_dir_all(dir)?;
        }
    }

    let mut out = String::from("sqlite://");
    out.push_str(&p.to_string_lossy().replace('\\', "/"));
    if let Some(q) = query {
        out.push('?');
        out.push_str(q);
    }
    Ok(out)
}

/// Gatekeeper Server - admin-approved access to a media-download chat bot
#[derive(Parser)]
#[command(name = "gatekeeper-server")]
#[command(about = "Gatekeeper Server - admin-approved access to a media-download chat bot")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port for HTTP server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Print current configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Use an in-memory database
    #[arg(long)]
    mock: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Check configuration
    Check,
    /// Seed the database from the flat-file pending/approved lists
    ImportLegacy {
        /// JSON array of user ids waiting for a decision
        #[arg(long)]
        pending: PathBuf,
        /// JSON array of approved user ids
        #[arg(long)]
        approved: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration (normalized home_dir is applied inside)
    let mut config = AppConfig::load(cli.config.as_deref())?;
    config.apply_overrides(cli.port, cli.verbose);

    let logging_config = config.logging.as_ref().cloned().unwrap_or_default();
    runtime::logging::init_logging_from_config(&logging_config, Path::new(&config.server.home_dir));
    tracing::info!("Gatekeeper Server starting");

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config, cli.mock).await,
        Commands::Check => check_config(config).await,
        Commands::ImportLegacy { pending, approved } => {
            import_legacy(config, cli.mock, &pending, &approved).await
        }
    }
}

/// Detect DB backend from URL scheme.
fn detect_from_dsn(cfg: &DatabaseConfig) -> Result<&'static str> {
    let raw = cfg.url.trim().to_owned();
    if raw.is_empty() {
        return Err(anyhow!("Database URL not configured"));
    }

    let url = Url::parse(&raw).map_err(|e| anyhow!("Invalid database DSN '{}': {}", raw, e))?;

    match url.scheme() {
        "sqlite" | "sqlite3" => Ok("sqlite"),
        "postgres" | "postgresql" => Ok("postgres"),
        other => Err(anyhow!("Unsupported database type: {}", other)),
    }
}

/// Open the configured database (in-memory SQLite with `--mock`) and apply migrations.
async fn open_database(config: &AppConfig, mock: bool) -> Result<DbHandle> {
    let base_dir = PathBuf::from(&config.server.home_dir);

    let db_config = config.database.clone();
    let mut final_dsn = if mock {
        "sqlite::memory:".to_string()
    } else {
        let db_config = db_config
            .as_ref()
            .ok_or_else(|| anyhow!("No database configuration found"))?;
        detect_from_dsn(db_config)?;
        db_config.url.trim().to_owned()
    };

    // Absolutize sqlite DSNs to avoid cwd issues
    if final_dsn.starts_with("sqlite://") {
        final_dsn = absolutize_sqlite_dsn(&final_dsn, &base_dir, true)?;
    }

    let connect_opts = ConnectOpts {
        max_conns: db_config.as_ref().and_then(|c| c.max_conns),
        acquire_timeout: Some(Duration::from_secs(5)),
        sqlite_busy_timeout: db_config
            .as_ref()
            .and_then(|c| c.busy_timeout_ms)
            .map(|ms| Duration::from_millis(ms as u64)),
        create_sqlite_dirs: true,
        ..Default::default()
    };

    tracing::info!("Connecting to database: {}", final_dsn);
    let db = DbHandle::connect(&final_dsn, connect_opts).await?;
    tracing::info!("Connected DB backend: {:?}", db.engine());

    AccessRequests::migrate(&db).await?;
    Ok(db)
}

fn module_config(config: &AppConfig) -> Result<AccessRequestsConfig> {
    let cfg: AccessRequestsConfig = config
        .module_config(MODULE_NAME)
        .context("modules.access_requests")?;
    cfg.validate()?;
    Ok(cfg)
}

async fn run_server(config: AppConfig, mock: bool) -> Result<()> {
    tracing::info!("Initializing modules...");
    let module_cfg = module_config(&config)?;

    let db = open_database(&config, mock).await?;
    let module = AccessRequests::init(&db, &module_cfg)?;

    let router = http::build_router(&module, config.server.timeout_sec);
    let result = http::serve(router, &config.server.host, config.server.port).await;

    db.close().await;
    tracing::info!("Gatekeeper Server stopped");
    result
}

async fn check_config(config: AppConfig) -> Result<()> {
    tracing::info!("Checking configuration...");

    if let Some(db_config) = &config.database {
        detect_from_dsn(db_config)?;
    }
    module_config(&config)?;

    tracing::info!("Configuration is valid");
    println!("Configuration check passed");
    println!("Server config:");
    println!("{}", config.to_yaml()?);

    Ok(())
}

async fn import_legacy(
    config: AppConfig,
    mock: bool,
    pending: &Path,
    approved: &Path,
) -> Result<()> {
    let lists = LegacyLists::load(pending, approved)?;
    let db = open_database(&config, mock).await?;

    let store = AccessRequests::status_store(db.sea());
    let report = lists.import_into(store.as_ref()).await;
    db.close().await;

    let report = report?;
    println!(
        "Imported {} pending and {} approved users ({} skipped)",
        report.pending, report.approved, report.skipped
    );
    Ok(())
}
