use std::path::PathBuf;

use clap::Parser;
use syspulse::{
    actors::{driver::SamplingDriver, hub::HubHandle},
    alerts::AlertEvaluator,
    api::{ApiConfig, ApiState, spawn_api_server},
    config::{Config, read_config_file},
    sampler::SystemSampler,
};
use tracing::{info, level_filters::LevelFilter, trace, warn};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Parser)]
#[command(version, about = "Real-time host telemetry over WebSocket")]
struct Args {
    /// Config file (TOML or JSON)
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Port to listen on, overrides the config file and environment
    #[arg(short, long)]
    port: Option<u16>,
}

fn init(development: bool) {
    let level = if development {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let filter = filter::Targets::new().with_targets(vec![
        ("syspulse", level),
        ("syspulse_server", level),
        ("tower_http", level),
    ]);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

fn load_config(args: &Args) -> anyhow::Result<Config> {
    let config = match &args.file {
        Some(file) => read_config_file(file)?,
        None => Config::default(),
    };

    let mut config = config.with_env_overrides();
    if let Some(port) = args.port {
        config.port = port;
    }

    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();
    let config = load_config(&args)?;

    init(config.is_development());
    trace!("started with args: {args:?}");

    info!(
        "SysPulse {} starting in {} mode",
        env!("CARGO_PKG_VERSION"),
        config.environment
    );

    let evaluator = AlertEvaluator::new(config.alerts);
    let hub = HubHandle::spawn(&config.hub);

    let driver = SamplingDriver::new(
        SystemSampler::new(config.sampler.clone()),
        evaluator.clone(),
        hub.clone(),
        config.update_interval(),
    );
    let driver = driver.spawn();

    let state = ApiState::new(evaluator, hub.clone(), config.hub.write_timeout());
    let api_config = ApiConfig {
        bind_addr: config.bind_addr(),
        enable_cors: true,
        static_dir: Some(config.static_dir.clone()),
    };
    let addr = spawn_api_server(api_config, state).await?;
    info!("dashboard available at http://{addr}");

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                warn!("failed to listen for shutdown signal: {e}");
            }
            info!("shutting down");
        }
        _ = driver => {
            warn!("sampling driver stopped unexpectedly");
        }
    }

    hub.shutdown().await;

    Ok(())
}
