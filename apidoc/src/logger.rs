//! Logging setup for the `apidoc` binary.
//!
//! Log lines go to stderr so that `apidoc build` without `--output` can
//! write the document to stdout untouched.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global tracing subscriber.
///
/// `verbose` wins over `quiet`; with neither, `RUST_LOG` is honoured and
/// the fallback is warnings only.
pub fn init_logger(verbose: bool, quiet: bool) {
    let filter = if verbose {
        EnvFilter::new("apidoc=debug,apidoc_core=debug")
    } else if quiet {
        EnvFilter::new("apidoc=error,apidoc_core=error")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("apidoc=warn,apidoc_core=warn"))
    };

    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .without_time();

    // A second call (e.g. from tests) keeps the first subscriber.
    let _ = tracing_subscriber::registry().with(filter).with(fmt_layer).try_init();
}
