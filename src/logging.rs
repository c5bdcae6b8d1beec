//! Tracing subscriber setup

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Transport crates that flood `debug` output
const QUIET_CRATES: &[&str] = &[
    "h2",
    "hyper",
    "hyper_util",
    "reqwest",
    "rustls",
    "alloy_transport_http",
    "alloy_rpc_client",
];

/// Filter directives for the requested verbosity; `RUST_LOG` wins when set
fn filter_spec(verbose: bool, rust_log: Option<&str>) -> String {
    if let Some(spec) = rust_log.map(str::trim).filter(|s| !s.is_empty()) {
        return spec.to_string();
    }
    let base = if verbose { "debug" } else { "info" };
    let quiet: Vec<String> = QUIET_CRATES.iter().map(|c| format!("{}=info", c)).collect();
    format!("{},{}", base, quiet.join(","))
}

/// Install the global subscriber. Call once, before anything logs.
pub fn setup_logging(verbose: bool, json: bool) {
    let rust_log = std::env::var("RUST_LOG").ok();
    let spec = filter_spec(verbose, rust_log.as_deref());
    let filter = EnvFilter::try_new(&spec).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::registry().with(filter);

    if json {
        subscriber
            .with(fmt::layer().json().with_current_span(true))
            .init();
    } else {
        subscriber.with(fmt::layer().with_target(true).compact()).init();
    }

    tracing::debug!(filter = %spec, json, "Logging initialized");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_keeps_transports_quiet() {
        let spec = filter_spec(true, None);
        assert!(spec.starts_with("debug,"));
        assert!(spec.contains("hyper=info"));
        assert!(EnvFilter::try_new(&spec).is_ok());
    }

    #[test]
    fn test_rust_log_overrides() {
        assert_eq!(filter_spec(true, Some("warn,amm_trade_bot=trace")), "warn,amm_trade_bot=trace");
        assert!(filter_spec(false, Some("  ")).starts_with("info,"));
    }
}
