//! hourly-stats daemon: entry point for running a counter node.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use hstats_node::{
    init_logging, LogFormat, NodeConfig, ShutdownBarrier, ShutdownController, StatsDb,
};
use hstats_rpc::StatsServer;

#[derive(Parser)]
#[command(name = "hstats", about = "Hourly event counter daemon")]
struct Cli {
    /// Directory of the LMDB environment holding the snapshot.
    #[arg(long, env = "HSTATS_DB_PATH")]
    db_path: Option<PathBuf>,

    /// Token clients must send in the `Authorization` header.
    #[arg(long, env = "HSTATS_AUTH_TOKEN", hide_env_values = true)]
    auth_token: Option<String>,

    /// Address to bind the HTTP server to.
    #[arg(long, env = "HOST")]
    host: Option<String>,

    /// Port for the HTTP server.
    #[arg(long, env = "PORT")]
    port: Option<u16>,

    /// Seconds between periodic snapshot flushes.
    #[arg(long, env = "HSTATS_FLUSH_INTERVAL_SECS")]
    flush_interval_secs: Option<u64>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "HSTATS_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "HSTATS_LOG_FORMAT")]
    log_format: Option<String>,

    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Subcommand.
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Start the node and HTTP server.
    Run,
    /// Print the effective configuration as TOML.
    #[command(name = "dump-config")]
    DumpConfig,
}

impl Cli {
    fn resolve_config(&self) -> anyhow::Result<NodeConfig> {
        let base = match &self.config {
            Some(path) => NodeConfig::from_toml_file(&path.to_string_lossy())
                .with_context(|| format!("failed to load config file {}", path.display()))?,
            None => NodeConfig::default(),
        };

        Ok(NodeConfig {
            db_path: self.db_path.clone().unwrap_or(base.db_path),
            host: self.host.clone().unwrap_or(base.host),
            port: self.port.unwrap_or(base.port),
            auth_token: self.auth_token.clone().unwrap_or(base.auth_token),
            flush_interval_secs: self.flush_interval_secs.unwrap_or(base.flush_interval_secs),
            log_level: self.log_level.clone().unwrap_or(base.log_level),
            log_format: self.log_format.clone().unwrap_or(base.log_format),
            ..base
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.resolve_config()?;

    match cli.command {
        Command::DumpConfig => {
            print!("{}", config.redacted().to_toml_string());
        }
        Command::Run => {
            let format: LogFormat = config.log_format.parse()?;
            init_logging(format, &config.log_level);
            config.validate()?;
            run(config).await?;
        }
    }

    Ok(())
}

async fn run(config: NodeConfig) -> anyhow::Result<()> {
    tracing::info!(
        path = %config.db_path.display(),
        flush_interval_secs = config.flush_interval_secs,
        "starting hourly-stats node"
    );

    let db = Arc::new(StatsDb::open_lmdb(&config).context("failed to open stats DB")?);
    db.start(config.flush_interval());

    let shutdown = ShutdownController::new();
    let barrier = Arc::new(ShutdownBarrier::new(2));

    let server = StatsServer::new(config.host.clone(), config.port, &config.auth_token, db.clone());
    let mut server_task = {
        let rx = shutdown.subscribe();
        let barrier = barrier.clone();
        tokio::spawn(async move {
            let served = server.serve(rx).await;
            barrier.signal();
            served
        })
    };

    // A server that fails to bind ends the process just like a signal does.
    let early_exit = tokio::select! {
        _ = shutdown.wait_for_signal() => None,
        joined = &mut server_task => Some(joined),
    };
    shutdown.shutdown();

    let db_task = {
        let db = db.clone();
        let barrier = barrier.clone();
        tokio::spawn(async move {
            let closed = db.close().await;
            barrier.signal();
            closed
        })
    };

    barrier.wait().await;

    let served = match early_exit {
        Some(joined) => joined,
        None => server_task.await,
    };
    let closed = db_task.await.context("persistence manager task failed")?;

    closed.context("final snapshot failed")?;
    served
        .context("HTTP server task failed")?
        .context("HTTP server failed")?;

    tracing::info!("hourly-stats daemon exited cleanly");
    Ok(())
}
