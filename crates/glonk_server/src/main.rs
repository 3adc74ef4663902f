use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tokio::net::TcpListener;
use tokio::signal;
use tracing_subscriber::EnvFilter;

use glonk_server::{build_router, AppState};
use glonk_store::{load_or_init_config, DatabaseConfig, GlonkConfig, GlonkStore, Registry};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Command::Serve(args) => serve(args).await,
        Command::Bootstrap(args) => bootstrap(args).await,
    }
}

#[derive(Parser)]
#[command(author, version, about = "Generic record store over HTTP")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server.
    Serve(ServeArgs),
    /// Create or upgrade the database schema and exit.
    Bootstrap(StoreArgs),
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Storage {
    #[value(alias = "sqlite3")]
    Sqlite,
    #[value(alias = "psql")]
    Postgres,
}

#[derive(Args)]
struct StoreArgs {
    /// Directory holding glonk.json and the default SQLite database.
    #[arg(long, default_value = ".glonk")]
    data_dir: PathBuf,
    /// Storage backend, overriding the config file.
    #[arg(long, value_enum)]
    storage: Option<Storage>,
    /// Postgres connection string, or the SQLite file path.
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,
}

#[derive(Args)]
struct ServeArgs {
    #[command(flatten)]
    store: StoreArgs,
    /// Address to listen on, overriding the config file.
    #[arg(long)]
    listen_addr: Option<String>,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

/// Config file values, with command-line flags taking precedence.
fn resolve_config(args: &StoreArgs) -> Result<GlonkConfig> {
    let mut config = load_or_init_config(&args.data_dir)
        .with_context(|| format!("load config from {}", args.data_dir.display()))?;
    let storage = args.storage.or(match config.database {
        DatabaseConfig::Sqlite { .. } => None,
        DatabaseConfig::Postgres { .. } => Some(Storage::Postgres),
    });
    match (storage, args.database_url.clone()) {
        (Some(Storage::Postgres), Some(url)) => {
            config.database = DatabaseConfig::Postgres { url };
        }
        (Some(Storage::Postgres), None) => {
            if !matches!(config.database, DatabaseConfig::Postgres { .. }) {
                bail!("--storage postgres needs --database-url or DATABASE_URL");
            }
        }
        (Some(Storage::Sqlite), url) => {
            let path = match (url, &config.database) {
                (Some(url), _) => Some(url),
                (None, DatabaseConfig::Sqlite { path }) => path.clone(),
                (None, _) => None,
            };
            config.database = DatabaseConfig::Sqlite { path };
        }
        (None, Some(url)) if url.starts_with("postgres://") || url.starts_with("postgresql://") => {
            config.database = DatabaseConfig::Postgres { url };
        }
        (None, Some(path)) => {
            config.database = DatabaseConfig::Sqlite { path: Some(path) };
        }
        (None, None) => {}
    }
    Ok(config)
}

async fn open(args: &StoreArgs, config: &GlonkConfig) -> Result<(GlonkStore, Arc<Registry>)> {
    let registry = Arc::new(Registry::new().context("describe record kinds")?);
    let store = GlonkStore::connect(config, &args.data_dir, registry.clone())
        .await
        .with_context(|| format!("connect to {} database", config.backend_name()))?;
    Ok((store, registry))
}

async fn bootstrap(args: StoreArgs) -> Result<()> {
    let config = resolve_config(&args)?;
    let (store, registry) = open(&args, &config).await?;
    for meta in registry.kinds() {
        tracing::info!("table {} ready for kind {}", meta.table(), meta.kind());
    }
    tracing::info!("{} schema is up to date", store.backend_name());
    Ok(())
}

async fn serve(args: ServeArgs) -> Result<()> {
    let config = resolve_config(&args.store)?;
    let listen_addr = args
        .listen_addr
        .clone()
        .unwrap_or_else(|| config.listen_addr().to_string());
    let (store, registry) = open(&args.store, &config).await?;
    let state = AppState::new(Arc::new(store), registry);

    let listener = TcpListener::bind(&listen_addr)
        .await
        .with_context(|| format!("bind {listen_addr}"))?;
    tracing::info!("listening on {}", display_addr(&listener, &listen_addr));
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("http server")?;
    tracing::info!("server stopped");
    Ok(())
}

fn display_addr(listener: &TcpListener, fallback: &str) -> String {
    listener
        .local_addr()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|_| fallback.to_string())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl+C: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!("failed to listen for SIGTERM: {err}");
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
}
