use lodestone_nbt::NbtLimits;
use lodestone_types::VersionClamp;
use serde::Deserialize;
use std::path::Path;

/// What to do with a packet whose id the registry does not know.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnrecognizedPolicy {
    /// Hand the raw bytes back so a proxy can pass them through.
    #[default]
    Forward,
    Drop,
    Reject,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CodecConfig {
    #[serde(default = "default_max_frame_length")]
    pub max_frame_length: usize,
    #[serde(default = "default_max_nbt_depth")]
    pub max_nbt_depth: usize,
    #[serde(default = "default_max_nbt_bytes")]
    pub max_nbt_bytes: usize,
    #[serde(default)]
    pub version_clamp: VersionClamp,
    #[serde(default)]
    pub unrecognized: UnrecognizedPolicy,
}

fn default_max_frame_length() -> usize {
    2 * 1024 * 1024
}

fn default_max_nbt_depth() -> usize {
    lodestone_nbt::DEFAULT_MAX_DEPTH
}

fn default_max_nbt_bytes() -> usize {
    2 * 1024 * 1024
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_frame_length: default_max_frame_length(),
            max_nbt_depth: default_max_nbt_depth(),
            max_nbt_bytes: default_max_nbt_bytes(),
            version_clamp: VersionClamp::default(),
            unrecognized: UnrecognizedPolicy::default(),
        }
    }
}

impl CodecConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            let config: CodecConfig = toml::from_str(&contents)?;
            Ok(config)
        } else {
            tracing::info!("No codec config found at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn nbt_limits(&self) -> NbtLimits {
        NbtLimits {
            max_depth: self.max_nbt_depth,
            max_bytes: self.max_nbt_bytes,
        }
    }
}
