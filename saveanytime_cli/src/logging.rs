use anyhow::Result;
use std::io;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Log to stderr so prompts and results on stdout stay readable. `RUST_LOG` is honored unless
/// `verbose` is set.
pub(crate) fn setup_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let console_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .compact();

    tracing_subscriber::registry()
        .with(console_layer)
        .with(filter)
        .try_init()?;

    tracing::debug!("logging initialized");

    Ok(())
}
