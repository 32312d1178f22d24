//! Stderr logging for the CLI.
//!
//! Stdout is reserved for command output (a bare port number when piped),
//! so every log line goes to stderr.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialise the tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise `-v` selects debug and `-vv` trace
/// for the portfinder crates, and everything else stays at warn.
pub fn init_logging(verbose: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbose > 1);

    // A second init (e.g. from tests) is harmless.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .try_init();
}

fn default_directives(verbose: u8) -> String {
    match verbose {
        0 => "warn".to_string(),
        1 => "warn,portfinder=debug,portfinder_core=debug".to_string(),
        _ => "warn,portfinder=trace,portfinder_core=trace".to_string(),
    }
}
