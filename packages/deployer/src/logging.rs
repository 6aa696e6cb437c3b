//! Logging via the tracing crate.

use std::io;

use tracing::error;
use tracing_subscriber::EnvFilter;

/// Console output format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

fn filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Installs the global subscriber. `RUST_LOG` overrides the default `info`
/// level. Call once per process.
pub fn init(format: LogFormat) -> anyhow::Result<()> {
    match format {
        LogFormat::Text => tracing::subscriber::set_global_default(
            tracing_subscriber::fmt()
                .with_writer(io::stdout)
                .with_env_filter(filter())
                .with_target(false)
                .finish(),
        )?,
        LogFormat::Json => tracing::subscriber::set_global_default(
            tracing_subscriber::fmt()
                .with_writer(io::stdout)
                .with_env_filter(filter())
                .json()
                .finish(),
        )?,
    }

    Ok(())
}

/// Logs a failed run through the installed subscriber, so the json format
/// carries failures too.
pub fn report_failure(err: &anyhow::Error) {
    error!(error = %format!("{err:#}"), "run failed");
}
