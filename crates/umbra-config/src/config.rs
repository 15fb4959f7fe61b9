//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};

use glam::{UVec2, UVec3, Vec3};
use serde::{Deserialize, Serialize};
use umbra_volume::{
    AtlasLayout, LightDirection, RayMarchConfig, ShadowError, ShadowPass, SlicePolicy,
};

use crate::error::ConfigError;

/// Top-level configuration of one shadow pass invocation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Input atlas settings.
    pub input: InputConfig,
    /// Output image settings.
    pub output: OutputConfig,
    /// Atlas geometry.
    pub atlas: AtlasConfig,
    /// Light and ray-march settings.
    pub shadow: ShadowConfig,
    /// Execution settings.
    pub compute: ComputeConfig,
    /// Logging settings.
    pub debug: DebugConfig,
}

/// Input atlas configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InputConfig {
    /// Path of the tiled density image.
    pub path: PathBuf,
    /// RGBA channel holding density (0 = red).
    pub density_channel: usize,
}

/// Output image configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    /// Path of the shadowed image. Format follows the extension.
    pub path: PathBuf,
}

/// Atlas geometry configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AtlasConfig {
    /// Field dimensions (X, Y, Z) in voxels.
    pub data_shape: [u32; 3],
    /// Image dimensions (W, H) in pixels.
    pub texture_shape: [u32; 2],
    /// Tile grid (columns, rows).
    pub tile_layout: [u32; 2],
    /// How slices map to tiles when Z exceeds the tile count.
    pub slice_policy: SlicePolicy,
}

/// Light and ray-march configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ShadowConfig {
    /// Direction toward the light. Normalised before use.
    pub light_direction: [f32; 3],
    /// Samples per ray.
    pub steps: u32,
    /// Absorption scale; per-sample opacity is `alpha_scale / steps`.
    pub alpha_scale: f32,
}

/// Execution configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ComputeConfig {
    /// Worker threads (0 = one per CPU, 1 = run on the calling thread).
    pub threads: usize,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
    /// Optional JSON log file.
    pub log_file: Option<PathBuf>,
}

// --- Default implementations ---

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("atlas.png"),
            density_channel: 0,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("shadow.png"),
        }
    }
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            data_shape: [4, 4, 2],
            texture_shape: [8, 4],
            tile_layout: [2, 1],
            slice_policy: SlicePolicy::Exact,
        }
    }
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            light_direction: [1.0, 0.0, 0.0],
            steps: 81,
            alpha_scale: 2.0,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_file: None,
        }
    }
}

/// Platform default location of the config file (`<config dir>/umbra/umbra.ron`).
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|dir| dir.join("umbra").join("umbra.ron"))
        .ok_or(ConfigError::NoConfigDir)
}

// --- Load / Save ---

impl Config {
    /// Load config from `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load config from `path`, or create a default config file there.
    pub fn load_or_create(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            let config = Config::default();
            config.save(path)?;
            log::info!("Created default config at {}", path.display());
            Ok(config)
        }
    }

    /// Save config to `path` as RON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(ConfigError::WriteError)?;
        }

        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }
}

// --- Conversion into validated pass inputs ---

impl Config {
    /// Validated atlas layout.
    pub fn layout(&self) -> Result<AtlasLayout, ShadowError> {
        AtlasLayout::new(
            UVec3::from_array(self.atlas.data_shape),
            UVec2::from_array(self.atlas.texture_shape),
            UVec2::from_array(self.atlas.tile_layout),
            self.atlas.slice_policy,
        )
    }

    /// Validated light and ray-march parameters.
    pub fn pass(&self) -> Result<ShadowPass, ShadowError> {
        let light = LightDirection::new(Vec3::from_array(self.shadow.light_direction))?;
        let march = RayMarchConfig::new(self.shadow.steps, self.shadow.alpha_scale)?;
        Ok(ShadowPass::new(light, march))
    }
}
