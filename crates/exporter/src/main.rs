use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bgfa_exporter::config::ExporterConfig;
use bgfa_exporter::monitor::{monitor_jobs, MonitorConfig, MonitorOutcome};
use bgfa_exporter::submit::submit_cells;
use bgfa_platform::{PlatformApi, Session};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bgfa_exporter=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ExporterConfig::from_env();
    config.validate().expect("Invalid exporter configuration");

    let api_key = std::env::var("PLATFORM_API_KEY").expect("PLATFORM_API_KEY must be set");

    if let Err(e) = run(config, &api_key).await {
        tracing::error!(error = %e, "Export run failed");
        std::process::exit(1);
    }
}

async fn run(config: ExporterConfig, api_key: &str) -> anyhow::Result<()> {
    let session = Session::authenticate(&config.platform_url, api_key, &config.project).await?;
    let platform = PlatformApi::new(session);

    let region = config.region()?;
    let cells = bgfa_core::partition(&region, config.splits_x, config.splits_y)?;
    tracing::info!(
        cells = cells.len(),
        splits_x = config.splits_x,
        splits_y = config.splits_y,
        "Partitioned region",
    );

    let jobs = submit_cells(&platform, &cells, &config).await;
    tracing::info!(
        submitted = jobs.len(),
        skipped = cells.len() - jobs.len(),
        "Submission phase complete",
    );
    if jobs.is_empty() {
        tracing::warn!("No jobs were accepted, nothing to monitor");
        return Ok(());
    }

    // Ctrl-C stops polling. Remote jobs keep running server-side; the
    // report lists whatever was still unresolved.
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Ctrl-C received, stopping monitor");
                cancel.cancel();
            }
        });
    }

    let monitor_config = MonitorConfig {
        poll_interval: config.poll_interval,
        max_wait: config.max_wait,
    };
    let report = monitor_jobs(&platform, jobs, &monitor_config, &cancel).await;

    tracing::info!(
        outcome = ?report.outcome,
        completed = report.completed.len(),
        failed = report.failed.len(),
        cancelled = report.cancelled.len(),
        unresolved = report.unresolved.len(),
        rounds = report.rounds,
        elapsed_secs = report.elapsed.as_secs(),
        "Monitoring complete",
    );
    for job in &report.unresolved {
        tracing::warn!(
            job = %job.handle.name,
            cell = job.cell_index,
            "Job was still running when monitoring stopped",
        );
    }

    if report.outcome != MonitorOutcome::Drained || !report.failed.is_empty() {
        anyhow::bail!(
            "{} job(s) failed, {} unresolved",
            report.failed.len(),
            report.unresolved.len()
        );
    }
    Ok(())
}
