//! Logging initialization

/// Initialize the logging system
///
/// Uses env_logger with default filter level of `info`.
/// Override with RUST_LOG environment variable, e.g.
/// `RUST_LOG=sculptr=debug` to see per-batch job timings.
///
/// # Example
/// ```
/// sculptr::core::logging::init();
/// log::info!("Sculpting session started");
/// ```
pub fn init() {
    // Safe to call more than once
    let _ = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info")
    ).try_init();
}
