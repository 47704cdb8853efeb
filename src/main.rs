//! SAM.gov Opportunity Monitor: binary entrypoint.
//! Loads configuration, wires the search source, title generator and issue
//! publisher, then polls until Ctrl-C.
//!
//! See `README.md` for configuration and `DESIGN.md` for architecture notes.

use std::sync::Arc;

use sam_opportunity_monitor::config::monitor::MonitorConfig;
use sam_opportunity_monitor::ingest::providers::sam_gov::SamGovProvider;
use sam_opportunity_monitor::notify::linear::LinearClient;
use sam_opportunity_monitor::title::ai_adapter::build_title_model;
use sam_opportunity_monitor::{metrics, Monitor, MonitorSettings, TitleGenerator};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Compact logs by default; `LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("sam_opportunity_monitor=info,warn"));

    let json = std::env::var("LOG_FORMAT")
        .ok()
        .is_some_and(|v| v.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "cannot listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    tracing::info!("interrupt received, stopping");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = match MonitorConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!(error = %e, "configuration error");
            std::process::exit(1);
        }
    };

    if let Some(addr) = cfg.metrics_addr {
        metrics::install_exporter(addr)?;
        tracing::info!(%addr, "prometheus exporter listening");
    } else {
        metrics::describe();
    }

    let source = SamGovProvider::new(cfg.sam.clone())?;
    let publisher = LinearClient::new(cfg.linear.clone())?;
    let titles = TitleGenerator::new(build_title_model(&cfg.ai)?);
    if !titles.ai_enabled() {
        tracing::warn!("OPENAI_API_KEY not set, using fallback titles");
    }

    let mut monitor = Monitor::new(
        MonitorSettings::from(&cfg.operational),
        Arc::new(source),
        titles,
        Arc::new(publisher),
    );
    monitor.run(shutdown_signal()).await;
    Ok(())
}
