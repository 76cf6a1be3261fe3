use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

/// Targets whose level follows the `--verbose` flag.
const CRATE_TARGETS: &[&str] = &["logward", "logward_core"];

/// Install the stderr subscriber. `RUST_LOG` is honoured; the logward
/// targets are raised to `debug` when `verbose` is set.
pub fn init_logging(verbose: bool) -> Result<()> {
    let filter = build_filter(verbose)?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install logger: {}", e))
}

fn build_filter(verbose: bool) -> Result<EnvFilter> {
    let level = if verbose { "debug" } else { "info" };
    let mut filter = EnvFilter::from_default_env();
    for target in CRATE_TARGETS {
        let directive = format!("{}={}", target, level)
            .parse()
            .with_context(|| format!("Invalid log directive for {}", target))?;
        filter = filter.add_directive(directive);
    }
    Ok(filter)
}
