use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{LifecycleError, LifecycleResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfaceViewConfig {
    /// Prefix for render thread names and log lines.
    #[serde(default = "default_label")]
    pub label: String,

    /// Honor `Renderer::on_draw_frame` asking for another frame.
    #[serde(default)]
    pub continuous_redraw: bool,
}

fn default_label() -> String {
    "glview".to_string()
}

impl Default for SurfaceViewConfig {
    fn default() -> Self {
        Self {
            label: default_label(),
            continuous_redraw: false,
        }
    }
}

impl SurfaceViewConfig {
    pub fn from_toml_str(s: &str) -> LifecycleResult<Self> {
        toml::from_str(s).map_err(|e| LifecycleError::Config(format!("parse: {}", e)))
    }

    /// Missing file means defaults; a file that exists but does not parse is an error.
    pub fn load_or_default(path: impl AsRef<Path>) -> LifecycleResult<Self> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(s) => toml::from_str(&s)
                .map_err(|e| LifecycleError::Config(format!("parse {}: {}", path.display(), e))),
            Err(_) => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_document_uses_defaults() {
        let cfg = SurfaceViewConfig::from_toml_str("").unwrap();
        assert_eq!(cfg, SurfaceViewConfig::default());
        assert_eq!(cfg.label, "glview");
        assert!(!cfg.continuous_redraw);
    }

    #[test]
    fn partial_document_keeps_other_defaults() {
        let cfg = SurfaceViewConfig::from_toml_str("continuous_redraw = true").unwrap();
        assert!(cfg.continuous_redraw);
        assert_eq!(cfg.label, "glview");
    }

    #[test]
    fn malformed_document_is_config_error() {
        let err = SurfaceViewConfig::from_toml_str("label = [").unwrap_err();
        assert!(matches!(err, LifecycleError::Config(_)));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = SurfaceViewConfig::load_or_default(dir.path().join("nope.toml")).unwrap();
        assert_eq!(cfg, SurfaceViewConfig::default());
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "label = \"preview\"").unwrap();
        let cfg = SurfaceViewConfig::load_or_default(file.path()).unwrap();
        assert_eq!(cfg.label, "preview");
    }
}
