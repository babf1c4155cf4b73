use tracing::{Level, level_filters::LevelFilter};
use tracing_subscriber::{
    EnvFilter, filter::filter_fn, fmt, layer::SubscriberExt, util::SubscriberInitExt,
};

/// Initialize logging for the CLI commands.
///
/// Uses the `INFO` level by default; customize it with the `RGO_LOG`
/// environment variable or the `-v` flags.
pub fn init(verbosity: Option<LevelFilter>) {
    let env_filter = EnvFilter::try_from_env("RGO_LOG").unwrap_or_else(|_| {
        EnvFilter::builder()
            .with_default_directive(verbosity.unwrap_or(LevelFilter::INFO).into())
            .from_env_lossy()
    });

    // disable spans below WARN level unless the user increased verbosity
    let verbose = env_filter
        .max_level_hint()
        .is_some_and(|level| level > Level::INFO);

    let ignore_info_spans = filter_fn(move |metadata| {
        let is_trace_or_debug = || metadata.level() < &Level::INFO;
        // If it's not a span, it's an event. We keep events.
        verbose || !metadata.is_span() || is_trace_or_debug()
    });

    fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .with_file(verbose)
        .with_line_number(verbose)
        .finish()
        .with(ignore_info_spans)
        .init();
}
