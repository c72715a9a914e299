use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use doctor_core::{EventBuffer, HopperClient, fixtures::load_fixtures_or_default};
use doctor_server::{DoctorConfig, PostgresTickerSource, doctor_app, feed};
use doctor_workflows::standard_suite;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser, Debug)]
#[command(about = "Doctor: validates the ticker batch-processing pipeline on demand")]
struct Args {
    /// YAML config file. Defaults apply to anything it leaves out.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn init_logging() {
    let filter = doctor_env::rust_log()
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).with_target(true).try_init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Args::parse();

    let config = match &cli.config {
        Some(path) => DoctorConfig::load_from_file(path)
            .with_context(|| format!("failed to load doctor config from {}", path.display()))?,
        None => DoctorConfig::default(),
    }
    .with_env_overrides();

    let seeds = load_fixtures_or_default(config.fixtures.path.as_deref())
        .context("failed to load ticker fixtures")?;
    let store = PostgresTickerSource::connect(&config.database, seeds)
        .await
        .with_context(|| {
            format!(
                "failed to connect to ticker database at {}",
                config.database.display_target()
            )
        })?;

    let buffer = Arc::new(
        EventBuffer::new(config.events.channel.clone())
            .with_bucket_capacity(config.events.bucket_capacity),
    );
    let events = feed::subscribe(&config.events.url, buffer.channel())
        .await
        .map_err(|err| anyhow::anyhow!(err))
        .with_context(|| format!("failed to subscribe to events at {}", config.events.url))?;
    let _feed = buffer.attach(events);

    let hopper = HopperClient::with_timeout(&config.hopper.url, config.hopper.timeout)
        .context("invalid hopper settings")?;
    let orchestrator = standard_suite(
        Arc::new(store),
        Arc::new(hopper),
        Arc::clone(&buffer),
        config.retry,
    );

    let port = config.server.port;
    let listener = TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("failed to bind doctor server on 0.0.0.0:{port}"))?;
    info!(port, "doctor server listening");

    axum::serve(listener, doctor_app(orchestrator))
        .await
        .context("doctor server terminated unexpectedly")?;

    Ok(())
}
