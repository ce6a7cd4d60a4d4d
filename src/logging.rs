//! Tracing init for the binary. Library modules log through `log::`
//! macros; the bridge routes them into the subscriber.

const DEFAULT_FILTER: &str = "smartdial=info,sqlx=warn";

/// Installs the global subscriber, filtered by `RUST_LOG` when set.
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing_from_env() {
    let _ = tracing_log::LogTracer::init();
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_FILTER.into());
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_level(true)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init_tracing_from_env();
        init_tracing_from_env();
        log::info!("still alive after double init");
    }
}
