//! Process-level setup.

/// Installs the `env_logger` backend for the `log` facade.
///
/// Safe to call more than once; later calls leave the existing logger in
/// place. Library code never installs a logger on its own.
///
/// # Example
///
/// ```no_run
/// instarig::init();
/// let params = instarig::ModelParams::init(Default::default(), 0)?;
/// # Ok::<(), instarig::Error>(())
/// ```
pub fn init() {
    let _ = env_logger::try_init();
    log::info!("instarig initialized");
}
