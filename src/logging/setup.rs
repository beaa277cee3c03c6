// SPDX-License-Identifier: GPL-3.0-only
use tracing_subscriber::{fmt, EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// `RUST_LOG` if set, else the configured level, else `info`
fn build_filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize tracing subscriber with configuration
pub fn setup_logging(log_level: &str, json: bool) -> anyhow::Result<()> {
    let registry = tracing_subscriber::registry().with(build_filter(log_level));

    if json {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
            )
            .try_init()?;
    } else {
        registry
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
            )
            .try_init()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_filter_accepts_directives() {
        let filter = build_filter("lifeboard=debug,reqwest=warn");
        assert!(filter.to_string().contains("lifeboard=debug") || std::env::var("RUST_LOG").is_ok());
    }

    #[test]
    fn test_setup_logging_only_once() {
        // The first call may already have happened in another test
        let _ = setup_logging("error", false);
        assert!(setup_logging("error", true).is_err());
    }
}
