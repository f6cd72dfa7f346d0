use crate::common::error::FatalError;

use config::Config;
use tracing::info;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

pub fn init_config(file: &str) -> Result<Config, FatalError> {
    info!("initialise configuration using {}", file);
    let mut settings = Config::default();
    settings
        .merge(config::File::with_name(file))
        .map_err(|e| FatalError::Configuration(format!("{}: {}", file, e)))?;
    Ok(settings)
}

pub fn set_log_level(config: &Config) {
    let level = match config.get_str("log").unwrap_or_default().as_str() {
        "info" => Level::INFO,
        "debug" => Level::DEBUG,
        "trace" => Level::TRACE,
        _ => Level::WARN,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_thread_names(true)
        .with_target(false)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// Seed for worker `thread_id`, following the `set_seed`/`seed` convention:
/// a fixed base seed offset per worker, or entropy when unset.
pub fn worker_seed(config: &Config, thread_id: u32) -> (bool, Option<u64>) {
    let set_seed = config.get_bool("set_seed").unwrap_or(false);
    if set_seed {
        let base = config.get_int("seed").unwrap_or(0) as u64;
        (true, Some(base + thread_id as u64))
    } else {
        (false, None)
    }
}
