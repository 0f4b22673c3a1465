//! Configuration system
//!
//! Engine settings are plain serde structs that load from TOML or RON files,
//! picked by extension. Every field has a default so partial files work.

use std::path::Path;

use serde::de::DeserializeOwned;
pub use serde::{Deserialize, Serialize};

use crate::foundation::math::Vec3;

/// On-disk formats a configuration can use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// `.toml`
    Toml,
    /// `.ron`
    Ron,
}

impl ConfigFormat {
    /// Format named by the file extension
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(Self::Toml),
            Some("ron") => Ok(Self::Ron),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Configuration trait
pub trait Config: Serialize + DeserializeOwned + Default {
    /// Parse configuration text in the given format
    fn parse(contents: &str, format: ConfigFormat) -> Result<Self, ConfigError> {
        match format {
            ConfigFormat::Toml => {
                toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
            }
            ConfigFormat::Ron => {
                ron::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
            }
        }
    }

    /// Render configuration text in the given format
    fn render(&self, format: ConfigFormat) -> Result<String, ConfigError> {
        match format {
            ConfigFormat::Toml => {
                toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
            }
            ConfigFormat::Ron => ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string())),
        }
    }

    /// Load configuration from a `.toml` or `.ron` file
    fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let format = ConfigFormat::from_path(path)?;
        Self::parse(&std::fs::read_to_string(path)?, format)
    }

    /// Save configuration to a `.toml` or `.ron` file
    fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = self.render(ConfigFormat::from_path(path)?)?;
        std::fs::write(path, contents)?;
        Ok(())
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// Reading or writing the file failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The text is not a valid configuration
    #[error("Parse error: {0}")]
    Parse(String),

    /// The configuration could not be written out
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// The file extension names no known format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Top-level engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Tick loop pacing
    pub tick: TickConfig,

    /// Physics constants shared by every body
    pub physics: PhysicsConfig,

    /// Spatial grid storage
    pub grid: GridConfig,
}

impl Config for EngineConfig {}

/// Tick loop configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TickConfig {
    /// Target duration of one tick in milliseconds
    pub tick_time_ms: u32,

    /// Sleep after each tick so it lasts `tick_time_ms`
    pub pace: bool,

    /// Milliseconds left unslept to absorb scheduler jitter
    pub safety_margin_ms: u32,

    /// Stop after this many ticks (headless runs and tests)
    pub max_ticks: Option<u64>,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            tick_time_ms: 20,
            pace: true,
            safety_margin_ms: 1,
            max_ticks: None,
        }
    }
}

/// Physics configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Global gravity vector
    pub gravity: [f32; 3],

    /// Default velocity damping factor for new bodies (1.0 = no loss)
    pub inertia: f32,

    /// Speeds at or below this snap to zero
    pub deadzone: f32,

    /// Circumference samples used by the recursive circle probe
    pub circle_segments: usize,
}

impl PhysicsConfig {
    /// Gravity as a vector
    pub fn gravity_vector(&self) -> Vec3 {
        Vec3::from(self.gravity)
    }
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: [0.0; 3],
            inertia: 0.93,
            deadzone: 0.09,
            circle_segments: 50,
        }
    }
}

/// Which grid storage backs the render matrix
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridKind {
    /// One map keyed by bit-packed 16-bit cell coordinates
    #[default]
    Packed,
    /// Nested per-axis maps over the full `i32` range
    Nested,
}

/// Grid configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Storage flavour
    pub kind: GridKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.tick.tick_time_ms, 20);
        assert!((config.physics.inertia - 0.93).abs() < f32::EPSILON);
        assert!((config.physics.deadzone - 0.09).abs() < f32::EPSILON);
        assert_eq!(config.physics.circle_segments, 50);
        assert_eq!(config.grid.kind, GridKind::Packed);
    }

    #[test]
    fn test_partial_toml() {
        let config: EngineConfig = toml::from_str(
            r#"
            [tick]
            tick_time_ms = 5
            max_ticks = 3

            [physics]
            gravity = [0.0, -1.0, 0.0]

            [grid]
            kind = "nested"
            "#,
        )
        .unwrap();

        assert_eq!(config.tick.tick_time_ms, 5);
        assert_eq!(config.tick.max_ticks, Some(3));
        assert!(config.tick.pace);
        assert_eq!(config.physics.gravity_vector(), Vec3::new(0.0, -1.0, 0.0));
        assert_eq!(config.grid.kind, GridKind::Nested);
    }

    #[test]
    fn test_ron_roundtrip_through_file() {
        let name = format!("scene_engine_config_{}.ron", std::process::id());
        let path = std::env::temp_dir().join(name);
        let path = path.to_string_lossy().to_string();

        let mut config = EngineConfig::default();
        config.tick.pace = false;
        config.save_to_file(&path).unwrap();

        let loaded = EngineConfig::load_from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_parse_ron_text() {
        let config = EngineConfig::parse("(grid: (kind: nested))", ConfigFormat::Ron).unwrap();
        assert_eq!(config.grid.kind, GridKind::Nested);
        assert_eq!(config.tick, TickConfig::default());

        let err = EngineConfig::parse("tick = ", ConfigFormat::Toml).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_unknown_extension_rejected() {
        let err = EngineConfig::default().save_to_file("engine.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(_)));
    }
}
