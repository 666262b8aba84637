use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration for the exif-scramble library.
///
/// Controls how much metadata is synthesized, how output files are named
/// and encoded, and what the drivers print.
///
/// # Loading
///
/// ```rust,no_run
/// use exif_scramble::config::Config;
///
/// // From a JSON file
/// let config = Config::load(Some("config.json".as_ref())).unwrap();
///
/// // Or use defaults and customize
/// let mut config = Config::default();
/// config.randomize.full = false;
/// config.output.prefix = "scrubbed_".into();
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Which fields are generated.
    pub randomize: RandomizeConfig,
    /// Output naming and encoding.
    pub output: OutputConfig,
    /// Metadata printed by the drivers around each file.
    pub display: DisplayConfig,
}

/// Controls which fields the synthesizer generates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomizeConfig {
    /// Full randomization (timestamps, exposure, GPS, descriptive text).
    /// If `false`, only camera identity, resolution and orientation are written.
    pub full: bool,
    /// Write the Windows XP* properties and call the shell property hook.
    pub windows_props: bool,
    /// Capture timestamps are drawn from this many days before now.
    pub max_age_days: u32,
}

/// Output file behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Prepended to the input file name to form the output name.
    pub prefix: String,
    /// Decode and re-encode the pixels instead of reusing the original scan data.
    pub reencode: bool,
    /// JPEG quality used when `reencode` is set.
    pub jpeg_quality: u8,
    /// Read the written file back and write it again.
    pub rewrite_after_save: bool,
}

/// What the batch drivers print for each file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub before: bool,
    pub after: bool,
}

impl Default for RandomizeConfig {
    fn default() -> Self {
        Self {
            full: true,
            windows_props: true,
            max_age_days: 730,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            prefix: "modified_".to_string(),
            reencode: false,
            jpeg_quality: 95,
            rewrite_after_save: false,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            before: false,
            after: true,
        }
    }
}

impl Config {
    /// Resolve the config file path: same directory as the executable.
    pub fn config_path() -> Result<PathBuf> {
        let exe_path = std::env::current_exe().context("Failed to get executable path")?;
        let exe_dir = exe_path
            .parent()
            .context("Failed to get executable directory")?;
        Ok(exe_dir.join("config.json"))
    }

    /// Load config from the given path, or from the default location.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        if !config_path.exists() {
            log::warn!(
                "Config file not found at {}. Using defaults.",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let contents =
            std::fs::read_to_string(&config_path).context("Failed to read config file")?;
        let config: Config =
            serde_json::from_str(&contents).context("Failed to parse config file")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would make an output path collide with its input.
    pub fn validate(&self) -> Result<()> {
        let prefix = &self.output.prefix;
        if prefix.is_empty() {
            anyhow::bail!("output.prefix must not be empty");
        }
        if prefix.contains(['/', '\\']) {
            anyhow::bail!("output.prefix must not contain path separators: {prefix:?}");
        }
        Ok(())
    }

    /// Save config to the given path, or to the default location.
    pub fn save(&self, path: Option<&Path>) -> Result<()> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        self.validate()?;
        let contents = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(&config_path, contents).context("Failed to write config file")?;
        log::info!("Config saved to {}", config_path.display());
        Ok(())
    }
}
