use std::sync::Once;

static INIT: Once = Once::new();

/// Installs a `tracing-subscriber` `EnvFilter` fmt layer once per test
/// binary. Run with `RUST_LOG=debug cargo test -- --nocapture` to see
/// engine output.
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .init();
    });
}
