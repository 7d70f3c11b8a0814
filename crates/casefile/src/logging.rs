//! Subscriber setup for the CLI.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is unset.
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "casefile=debug"
    } else {
        "casefile=info"
    }
}

/// Installs the global subscriber and forwards `log` records into it.
///
/// Leaf modules log through the `log` facade while the pipeline uses
/// `tracing` spans; both end up on the same stderr writer.
pub fn init(verbose: bool) {
    if let Err(e) = tracing_log::LogTracer::init() {
        eprintln!("Warning: log records will not be captured: {}", e);
    }

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| default_directive(verbose).into());

    let result = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init();
    if let Err(e) = result {
        eprintln!("Warning: tracing subscriber already installed: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive() {
        assert_eq!(default_directive(false), "casefile=info");
        assert_eq!(default_directive(true), "casefile=debug");
    }
}
