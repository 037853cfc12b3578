use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install one-line JSON logs on stdout.
///
/// `RUST_LOG` wins when set; otherwise `default_filter` applies, e.g. `"info,sqlx=warn"`
/// to keep per-query SQL logs out of production output. Event fields are flattened to
/// the top level of each record. A second call is a no-op.
pub fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let json = fmt::layer()
        .json()
        .flatten_event(true)
        .with_current_span(true)
        .with_target(true);
    let _ = tracing_subscriber::registry().with(filter).with(json).try_init();
}
