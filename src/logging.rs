use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Installs the global subscriber on stderr so stdout stays free for CLI output.
/// `RUST_LOG` takes precedence over the default level; `RUST_LOG_FORMAT=json`
/// switches to JSON lines for unattended runs.
pub fn init(verbose: bool) {
    let default_level = if verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();

    let use_json = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().flatten_event(true).with_writer(std::io::stderr))
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .with(filter)
            .init();
    }
}
