use env_logger::{Builder, Env};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset, e.g. `"info,glview=debug"`.
    #[serde(default = "default_filter")]
    pub filter: String,

    #[serde(default = "default_timestamps")]
    pub timestamps: bool,
}

fn default_filter() -> String {
    "info".to_string()
}

fn default_timestamps() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
            timestamps: default_timestamps(),
        }
    }
}

/// Installs the global logger. `RUST_LOG` wins over `cfg.filter`.
///
/// Returns `false` if a logger was already installed; that is not an error.
pub fn init_logging(cfg: &LoggingConfig) -> bool {
    let mut builder = Builder::from_env(Env::default().default_filter_or(cfg.filter.as_str()));
    if cfg.timestamps {
        builder.format_timestamp_millis();
    } else {
        builder.format_timestamp(None);
    }

    let ok = builder.is_test(false).try_init().is_ok();
    if ok {
        log::debug!(target: "glview", "logging.init filter='{}'", cfg.filter);
    }
    ok
}

/// Logger for unit/integration tests; output is captured per test.
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = LoggingConfig::default();
        assert_eq!(cfg.filter, "info");
        assert!(cfg.timestamps);
    }

    #[test]
    fn repeated_init_is_harmless() {
        init_test_logging();
        init_test_logging();
        assert!(!init_logging(&LoggingConfig::default()));
    }
}
