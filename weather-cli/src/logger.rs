use anyhow::Result;
use tracing_subscriber::{EnvFilter, filter::LevelFilter};

/// Diagnostics go to stderr so command output on stdout stays clean.
/// `RUST_LOG` overrides the default level.
pub fn init(verbose: bool) -> Result<()> {
    let level = if verbose { LevelFilter::DEBUG } else { LevelFilter::INFO };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env()?,
        )
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .with_file(verbose)
        .with_line_number(verbose)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
