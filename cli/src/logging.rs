use crate::config::get_log_dir;
use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter when RUST_LOG is unset
const DEFAULT_FILTER: &str = "sca=info,sca_cli=info,sca_assembly=info";

/// Initialize logging for the sca CLI
///
/// Logs are written to:
/// - XDG_DATA_HOME/sca/logs/ on Unix (typically ~/.local/share/sca/logs/)
/// - ~/Library/Application Support/sca/logs/ on macOS
/// - {FOLDERID_LocalAppData}/sca/logs/ on Windows
///
/// Log files are rotated daily with the pattern: sca.log.YYYY-MM-DD
///
/// Assembly problems are printed by the commands themselves, so the stderr
/// layer is only attached with `verbose`. The level can be controlled via
/// RUST_LOG, e.g. `RUST_LOG=sca_assembly=trace sca build store.toml -v`.
pub fn init(verbose: bool) -> Result<()> {
    let log_dir = get_log_dir()?;

    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, "sca.log");

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let stderr_layer = verbose.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .with_target(false)
            .compact()
            .boxed()
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false) // No ANSI colors in log files
                .with_target(true)
                .with_line_number(true),
        )
        .with(stderr_layer)
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    tracing::debug!("Logging initialized to {}", log_dir.display());

    Ok(())
}
