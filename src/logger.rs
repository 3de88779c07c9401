use std::io::Write;

use chrono::Local;
use env_logger::Builder;
use log::LevelFilter;

/// Crates whose own chatter drowns out per-company progress lines.
const NOISY_TARGETS: [&str; 4] = ["html5ever", "selectors", "reqwest", "cookie_store"];

/// Installs the console logger. Safe to call more than once; later calls
/// are ignored so tests can share it.
pub fn init(level: LevelFilter) {
    let mut builder = Builder::new();
    builder
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] - {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter(None, level);

    for target in NOISY_TARGETS {
        builder.filter(Some(target), LevelFilter::Warn);
    }

    if builder.try_init().is_ok() {
        log::info!("Logger initialized at level {}.", level);
    }
}
