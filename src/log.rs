use std::io::Write;

use env_logger::Builder;

/// Initialize the global logger, the level is controlled by `RUST_LOG`.
///
/// Calling it more than once is harmless, tests call it in every setup.
pub fn init_log() {
    let mut builder = Builder::from_default_env();
    let _ = builder
        .format_timestamp_secs()
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] [{}:{}] {}",
                record.level(),
                record.file().unwrap_or("unknown"),
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .is_test(cfg!(test))
        .try_init();
}
