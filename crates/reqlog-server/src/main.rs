//! reqlog-server: axum service tagging every request and log line with a correlation id.

mod config;
mod server;

use anyhow::Context;
use config::AppConfig;
use reqlog::RequestIdSettings;
use reqlog_tracing::LogFormat;

fn main() -> anyhow::Result<()> {
    // Parse CLI args
    let args: Vec<String> = std::env::args().collect();
    let config_path = args
        .iter()
        .position(|a| a == "--config")
        .and_then(|i| args.get(i + 1).cloned())
        .or_else(|| args.get(1).filter(|a| !a.starts_with('-')).cloned())
        .or_else(|| std::env::var("REQLOG_CONFIG").ok())
        .unwrap_or_else(|| "reqlog-server.toml".to_string());

    let config = AppConfig::load(&config_path)
        .with_context(|| format!("failed to load configuration from {config_path}"))?;
    let settings = RequestIdSettings::try_from(&config.request_logger)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let pipeline = reqlog_tracing::init_tracing(&config.tracing)?;
        reqlog::install(pipeline.processors(), &settings);
        if pipeline.format() == LogFormat::Text {
            tracing::debug!("Text output shows the request id through the request span only");
        }

        tracing::info!(
            config_path = %config_path,
            listen_address = %config.server.listen_address,
            header = %settings.header_name(),
            attribute_key = %settings.attribute_key(),
            "Starting reqlog-server"
        );

        server::run(config, settings).await
    })
}
