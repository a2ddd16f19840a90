use std::path::PathBuf;

use clap::Parser;
use color_eyre::Result;
use color_eyre::eyre::eyre;
use cpuloads::config::{Config, ENV_TOKEN, load_config, load_config_from_path};
use cpuloads::logging::{LogFormat, init_tracing};
use cpuloads::publish::{DryRunPublisher, InfluxPublisher, Publish};
use cpuloads::sampler::{CpuFamily, MemoryFamily, Sampler, Shutdown};
use cpuloads::system::FileSource;

#[derive(Parser)]
#[command(
    name = "cpuloads",
    about = "Publish per-core CPU and memory utilization to InfluxDB"
)]
struct Cli {
    /// Path to config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// InfluxDB base URL, e.g. http://localhost:8086
    #[arg(long)]
    url: Option<String>,

    /// InfluxDB organization
    #[arg(long)]
    org: Option<String>,

    /// InfluxDB bucket
    #[arg(long)]
    bucket: Option<String>,

    /// Stop after this many computed cycles per metric family.
    #[arg(long)]
    cycles: Option<u64>,

    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Log line protocol instead of sending it.
    #[arg(long, default_value_t = false)]
    dry_run: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_tracing(cli.log_format)?;
    let config = load_config_for_cli(&cli);
    tracing::debug!(?config, "configuration loaded");

    let (trigger, shutdown) = Shutdown::channel();
    tokio::spawn(async move {
        wait_for_signal().await;
        tracing::info!("shutdown requested, finishing current cycle");
        let _ = trigger.send(true);
    });

    if cli.dry_run {
        return run_collectors(&config, cli.cycles, || Ok(DryRunPublisher), shutdown).await;
    }

    let token = config
        .influx
        .token
        .clone()
        .ok_or_else(|| eyre!("no InfluxDB token configured; set {ENV_TOKEN}"))?;
    tracing::info!(
        url = %config.influx.url,
        org = %config.influx.org,
        bucket = %config.influx.bucket,
        "publishing to InfluxDB"
    );
    let make_publisher = || -> Result<InfluxPublisher> {
        Ok(InfluxPublisher::new(&config.influx, &token)?)
    };
    run_collectors(&config, cli.cycles, make_publisher, shutdown).await
}

/// Run the CPU and memory samplers side by side. They share nothing; the
/// first fatal error from either one stops both.
async fn run_collectors<P, M>(
    config: &Config,
    cycles: Option<u64>,
    make_publisher: M,
    shutdown: Shutdown,
) -> Result<()>
where
    P: Publish,
    M: Fn() -> Result<P>,
{
    if !config.metrics.enable_cpu && !config.metrics.enable_memory {
        tracing::warn!("both cpu and memory collection are disabled, nothing to do");
        return Ok(());
    }

    let cpu = async {
        if config.metrics.enable_cpu {
            Sampler::new(
                FileSource::new(&config.sources.cpu_stat_path),
                CpuFamily::from_config(&config.metrics),
                make_publisher()?,
            )
            .with_max_cycles(cycles)
            .run(shutdown.clone())
            .await?;
        }
        Ok::<_, color_eyre::Report>(())
    };

    let memory = async {
        if config.metrics.enable_memory {
            Sampler::new(
                FileSource::new(&config.sources.meminfo_path),
                MemoryFamily::from_config(&config.metrics),
                make_publisher()?,
            )
            .with_max_cycles(cycles)
            .run(shutdown.clone())
            .await?;
        }
        Ok::<_, color_eyre::Report>(())
    };

    tokio::try_join!(cpu, memory)?;
    Ok(())
}

async fn wait_for_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        if let Ok(mut terminate) = signal(SignalKind::terminate()) {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = terminate.recv() => {}
            }
            return;
        }
    }
    let _ = tokio::signal::ctrl_c().await;
}

fn load_config_for_cli(cli: &Cli) -> Config {
    let mut config = match &cli.config {
        Some(path) => load_config_from_path(path),
        None => load_config(),
    };
    config.apply_env(|key| std::env::var(key).ok());

    if let Some(ref url) = cli.url {
        config.influx.url = url.clone();
    }
    if let Some(ref org) = cli.org {
        config.influx.org = org.clone();
    }
    if let Some(ref bucket) = cli.bucket {
        config.influx.bucket = bucket.clone();
    }

    config
}
