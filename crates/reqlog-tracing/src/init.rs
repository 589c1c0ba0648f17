//! Subscriber setup and the [`LogPipeline`] handle.

use anyhow::Result;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, TracingConfig};
use crate::sink::{JsonSink, ProcessorChain};

/// Handle returned by [`init_tracing`].
///
/// Holds the processor chain of the installed sink so that hooks can be
/// registered once the subscriber is live.
#[derive(Clone)]
pub struct LogPipeline {
    processors: ProcessorChain,
    format: LogFormat,
}

impl LogPipeline {
    pub fn processors(&self) -> &ProcessorChain {
        &self.processors
    }

    pub fn format(&self) -> LogFormat {
        self.format
    }
}

/// Install the global tracing subscriber.
///
/// An invalid `log_level` falls back to `info`. Fails only if a global
/// subscriber has already been set.
pub fn init_tracing(config: &TracingConfig) -> Result<LogPipeline> {
    let env_filter =
        EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let processors = ProcessorChain::new();

    match config.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(JsonSink::new(config.service_name.clone(), processors.clone()))
            .with(env_filter)
            .try_init()?,
        LogFormat::Text => tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .with(env_filter)
            .try_init()?,
    }

    tracing::debug!(
        service = %config.service_name,
        format = ?config.format,
        "Log pipeline initialized"
    );

    Ok(LogPipeline {
        processors,
        format: config.format,
    })
}
