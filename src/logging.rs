//! Logging prelude module for convenient access to tracing macros.
//!
//! Per-entry skip/exclude/error annotations are logged at `debug!` and only
//! become visible when verbose mode is on, so the default output stays quiet
//! during large walks.

pub use tracing::{debug, error, info, trace, warn};

/// Initialize the tracing subscriber with environment filter support.
///
/// By default, logs at INFO level and above are displayed; verbose mode
/// (the `FCONCAT_VERBOSE` environment variable, or whatever the caller
/// resolved it into) lowers the default to DEBUG. `RUST_LOG` always wins:
///
/// ```bash
/// RUST_LOG=fconcat=trace fconcat . out.txt
/// FCONCAT_VERBOSE=1 fconcat . out.txt
/// ```
pub fn init_tracing(verbose: bool) {
	let default_filter = if verbose { "debug" } else { "info" };
	tracing_subscriber::fmt()
		.with_env_filter(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
		)
		.with_writer(std::io::stderr)
		.init();
}

/// Read the `FCONCAT_VERBOSE` environment variable once at startup.
///
/// Accepts `1` or `true` (case-insensitive). The result is stored in the
/// run configuration and passed explicitly; there is no process-wide flag.
pub fn verbose_from_env() -> bool {
	match std::env::var("FCONCAT_VERBOSE") {
		Ok(v) => {
			let v = v.trim().to_lowercase();
			v == "1" || v == "true"
		}
		Err(_) => false,
	}
}
