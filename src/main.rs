//! OG scraper: binary entrypoint.
//! Loads config, optionally serves metrics, then drives the scrape scheduler
//! (or a single run with `--once`).

use og_scraper::config::AppConfig;
use og_scraper::metrics::Metrics;
use og_scraper::scrape::scheduler::spawn_scheduler;
use og_scraper::ScrapeRuntime;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Compact logs by default; `LOG_FORMAT=json` for structured output.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("og_scraper=info,warn"));

    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

async fn run() -> anyhow::Result<()> {
    let cfg = AppConfig::load_default()?;
    let interval = cfg.scrape.interval();
    let metrics_bind = cfg.metrics_bind.clone();
    let runtime = Arc::new(ScrapeRuntime::new(cfg)?);

    if let Some(bind) = metrics_bind {
        let metrics = Metrics::init()?;
        tokio::spawn(async move {
            if let Err(e) = metrics.serve(&bind).await {
                tracing::error!(error = ?e, "metrics endpoint failed");
            }
        });
    }

    if std::env::args().any(|a| a == "--once") {
        let report = runtime.run_cycle().await?;
        tracing::info!(?report, "single run finished");
        return Ok(());
    }

    let handle = spawn_scheduler(interval, move || {
        let rt = Arc::clone(&runtime);
        async move { rt.run_cycle().await }
    });

    tokio::select! {
        res = handle => {
            if let Err(e) = res {
                anyhow::bail!("scheduler task ended: {e}");
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown requested");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = ?e, "og-scraper stopped");
            ExitCode::FAILURE
        }
    }
}
