/// Install a `tracing` fmt subscriber filtered by `RUST_LOG` (default `info`)
/// and route `log` records into it.
pub fn init_tracing_from_env() {
    let _ = tracing_log::LogTracer::init();
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into());
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_level(true)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        log::warn!("a global tracing subscriber is already installed");
    }
}
