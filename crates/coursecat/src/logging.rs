//! Structured logging setup.
//!
//! Library code logs through `tracing` (the database layer through `log`,
//! bridged by `tracing-log`). Binaries call [`init_tracing`] once at startup.

use std::sync::OnceLock;

use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Layer, Registry};

static LOGGING_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Installs the global subscriber. Later calls are no-ops.
///
/// `RUST_LOG` wins over `default_filter` when set. Output goes to stderr so
/// stdout stays free for command results. `json` switches to one JSON
/// object per event.
pub fn init_tracing(default_filter: &str, json: bool) {
    LOGGING_INITIALIZED.get_or_init(|| {
        let env_filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::try_new(default_filter).unwrap_or_else(|_| EnvFilter::new("info")),
        };

        let fmt_layer: Box<dyn Layer<Registry> + Send + Sync> = if json {
            fmt::layer()
                .json()
                .with_target(true)
                .with_current_span(true)
                .with_writer(std::io::stderr)
                .boxed()
        } else {
            fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .boxed()
        };

        let subscriber = tracing_subscriber::registry()
            .with(fmt_layer)
            .with(env_filter);

        if tracing::subscriber::set_global_default(subscriber).is_err() {
            tracing::debug!("Global tracing subscriber already set, keeping it");
            return;
        }

        // Route `log` records from the database layer into tracing.
        if let Err(e) = tracing_log::LogTracer::init() {
            tracing::debug!(error = %e, "log bridge already installed");
        }
    });
}
