use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// The terminal is in raw mode while the UI runs, so diagnostics go to a file.
pub fn setup() -> anyhow::Result<PathBuf> {
    let log_dir = dirs::state_dir()
        .or_else(dirs::cache_dir)
        .unwrap_or_else(std::env::temp_dir)
        .join("todo")
        .join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = log_dir.join("todo-tui.log");
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file)?;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .with_filter(env_filter);

    tracing_subscriber::registry().with(fmt_layer).try_init()?;

    Ok(log_file)
}
