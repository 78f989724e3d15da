//! Logging setup
//!
//! `RUST_LOG` takes precedence over the configured level. The dashboard owns
//! the terminal, so it logs to a file instead of stderr.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Destination for log output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    /// Append to a file, creating it and its directory if needed
    File(PathBuf),
    Discard,
}

/// Initialize the global tracing subscriber
pub fn init_logger(level: &str, target: LogTarget) -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);

    match target {
        LogTarget::Stderr => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(io::stderr)
                    .with_target(false)
                    .compact(),
            )
            .try_init()?,
        LogTarget::File(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(&path)?;
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(Mutex::new(file))
                        .with_ansi(false),
                )
                .try_init()?
        }
        LogTarget::Discard => registry
            .with(tracing_subscriber::fmt::layer().with_writer(io::sink))
            .try_init()?,
    }

    Ok(())
}
