use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::env;
use std::io::IsTerminal;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub drag: DragConfig,
    #[serde(default)]
    pub layout: LayoutConfig,
}

impl EngineConfig {
    /// Reject values the engine cannot work with.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first offending key.
    pub fn validate(&self) -> Result<()> {
        if !self.drag.min_move_distance.is_finite() || self.drag.min_move_distance < 0.0 {
            bail!("drag.min_move_distance must be a finite value >= 0");
        }
        let dims = [
            ("layout.column_width", self.layout.column_width),
            ("layout.header_height", self.layout.header_height),
            ("layout.card_height", self.layout.card_height),
        ];
        for (key, value) in dims {
            if !value.is_finite() || value <= 0.0 {
                bail!("{key} must be a finite value > 0");
            }
        }
        let gaps = [
            ("layout.column_gap", self.layout.column_gap),
            ("layout.card_gap", self.layout.card_gap),
        ];
        for (key, value) in gaps {
            if !value.is_finite() || value < 0.0 {
                bail!("{key} must be a finite value >= 0");
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DragConfig {
    /// Hide the insertion placeholder when the drop would leave the item where it is.
    #[serde(default = "default_true")]
    pub suppress_noop_placeholder: bool,
    /// Allow dragging column headers to reorder columns.
    #[serde(default = "default_true")]
    pub allow_container_reorder: bool,
    /// Pointer travel (px) required before a move re-runs resolution.
    /// The drop position is always resolved regardless.
    #[serde(default)]
    pub min_move_distance: f64,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            suppress_noop_placeholder: default_true(),
            allow_container_reorder: default_true(),
            min_move_distance: 0.0,
        }
    }
}

/// Grid geometry for hosts without a real layout engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    #[serde(default)]
    pub origin_x: f64,
    #[serde(default)]
    pub origin_y: f64,
    #[serde(default = "default_column_width")]
    pub column_width: f64,
    #[serde(default = "default_column_gap")]
    pub column_gap: f64,
    #[serde(default = "default_header_height")]
    pub header_height: f64,
    #[serde(default = "default_card_height")]
    pub card_height: f64,
    #[serde(default = "default_card_gap")]
    pub card_gap: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            origin_x: 0.0,
            origin_y: 0.0,
            column_width: default_column_width(),
            column_gap: default_column_gap(),
            header_height: default_header_height(),
            card_height: default_card_height(),
            card_gap: default_card_gap(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserConfig {
    #[serde(default)]
    pub output: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectiveConfig {
    pub engine: EngineConfig,
    pub user: UserConfig,
    pub resolved_output: String,
}

/// Load `<project_root>/.autoflow/config.toml`, falling back to defaults.
///
/// # Errors
///
/// Returns an error when the file exists but cannot be read, parsed, or
/// validated.
pub fn load_engine_config(project_root: &Path) -> Result<EngineConfig> {
    let path = project_root.join(".autoflow/config.toml");
    if !path.exists() {
        return Ok(EngineConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let config = toml::from_str::<EngineConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("Invalid config in {}", path.display()))?;
    Ok(config)
}

/// Load the per-user config from the platform config directory.
///
/// # Errors
///
/// Returns an error when the file exists but cannot be read or parsed.
pub fn load_user_config() -> Result<UserConfig> {
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(UserConfig::default());
    };

    let path = config_dir.join("autoflow/config.toml");
    if !path.exists() {
        return Ok(UserConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<UserConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Merge project config, user config, environment, and CLI flags.
///
/// # Errors
///
/// Returns an error when either config file is unreadable or invalid.
pub fn resolve_config(project_root: &Path, cli_json: bool) -> Result<EffectiveConfig> {
    let engine = load_engine_config(project_root)?;
    let user = load_user_config()?;

    let env_format = env::var("FORMAT").ok();
    let resolved_output = resolve_output(
        cli_json,
        user.output.as_deref(),
        env_format.as_deref(),
        std::io::stdout().is_terminal(),
    );

    Ok(EffectiveConfig {
        engine,
        user,
        resolved_output,
    })
}

fn resolve_output(
    cli_json: bool,
    user_output: Option<&str>,
    env_format: Option<&str>,
    is_tty: bool,
) -> String {
    fn normalize_output_mode(raw: &str) -> Option<&'static str> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pretty" | "human" => Some("pretty"),
            "text" | "table" => Some("text"),
            "json" => Some("json"),
            _ => None,
        }
    }

    if cli_json {
        return "json".to_string();
    }

    if let Some(mode) = env_format.and_then(normalize_output_mode) {
        return mode.to_string();
    }

    if let Some(mode) = user_output.and_then(normalize_output_mode) {
        return mode.to_string();
    }

    if is_tty { "pretty" } else { "text" }.to_string()
}

const fn default_true() -> bool {
    true
}

const fn default_column_width() -> f64 {
    280.0
}

const fn default_column_gap() -> f64 {
    16.0
}

const fn default_header_height() -> f64 {
    48.0
}

const fn default_card_height() -> f64 {
    72.0
}

const fn default_card_gap() -> f64 {
    8.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_project_config_uses_defaults() {
        let root = tempfile::tempdir().expect("tempdir");
        let cfg = load_engine_config(root.path()).expect("load should succeed");
        assert!(cfg.drag.suppress_noop_placeholder);
        assert!(cfg.drag.allow_container_reorder);
        assert!(cfg.drag.min_move_distance.abs() < f64::EPSILON);
        assert!((cfg.layout.column_width - 280.0).abs() < f64::EPSILON);
    }

    #[test]
    fn partial_config_keeps_other_defaults() {
        let root = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir_all(root.path().join(".autoflow")).expect("mkdir");
        std::fs::write(
            root.path().join(".autoflow/config.toml"),
            "[drag]\nallow_container_reorder = false\n\n[layout]\ncard_height = 40.0\n",
        )
        .expect("write");

        let cfg = load_engine_config(root.path()).expect("load");
        assert!(!cfg.drag.allow_container_reorder);
        assert!(cfg.drag.suppress_noop_placeholder);
        assert!((cfg.layout.card_height - 40.0).abs() < f64::EPSILON);
        assert!((cfg.layout.header_height - 48.0).abs() < f64::EPSILON);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let root = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir_all(root.path().join(".autoflow")).expect("mkdir");
        std::fs::write(
            root.path().join(".autoflow/config.toml"),
            "[layout]\ncolumn_width = 0.0\n",
        )
        .expect("write");

        let err = load_engine_config(root.path()).expect_err("zero width must fail");
        assert!(format!("{err:#}").contains("layout.column_width"));
    }

    #[test]
    fn malformed_toml_reports_path() {
        let root = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir_all(root.path().join(".autoflow")).expect("mkdir");
        std::fs::write(root.path().join(".autoflow/config.toml"), "[drag\n").expect("write");
        let err = load_engine_config(root.path()).expect_err("bad toml");
        assert!(err.to_string().contains("Failed to parse"));
    }

    #[test]
    fn cli_json_overrides_env_and_config() {
        assert_eq!(resolve_output(true, Some("pretty"), Some("text"), true), "json");
    }

    #[test]
    fn env_beats_user_config() {
        assert_eq!(resolve_output(false, Some("json"), Some("text"), true), "text");
    }

    #[test]
    fn legacy_aliases_are_normalized() {
        assert_eq!(resolve_output(false, Some("table"), Some("human"), false), "pretty");
        assert_eq!(resolve_output(false, Some("human"), Some("table"), false), "text");
    }

    #[test]
    fn tty_detection_is_the_fallback() {
        assert_eq!(resolve_output(false, None, None, true), "pretty");
        assert_eq!(resolve_output(false, Some("bogus"), None, false), "text");
    }
}
