//! Configuration management
//!
//! Provides unified configuration for models, data and training, stored as
//! TOML or JSON depending on the file extension.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{AdamSettings, DiscriminatorConfig, GeneratorConfig};
use crate::training::TrainingConfig;

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Model configuration
    pub model: ModelConfig,
    /// Data configuration
    pub data: DataConfig,
    /// Training configuration
    pub training: TrainingConfigFile,
}

/// Network hyperparameters shared by generator and discriminator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Latent dimension size
    pub n_hidden: i64,
    /// Spatial size of the deepest feature map
    pub bottom_width: i64,
    /// Channels of the deepest feature map, must be divisible by 8
    pub ch: i64,
    /// Weight initializer standard deviation
    pub wscale: f64,
    /// Discriminator instance noise standard deviation
    pub noise_sigma: f64,
}

/// Where training images come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    /// CIFAR-10 binary batches (`data_batch_*.bin`)
    Cifar10,
    /// A flat directory of png/jpg files
    ImageDir,
}

/// Data-related configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    /// Dataset format
    pub source: DataSource,
    /// Dataset directory
    pub path: String,
    /// Batch size
    pub batch_size: usize,
    /// Cap on the number of images used
    #[serde(default)]
    pub max_images: Option<usize>,
}

/// Training-related configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfigFile {
    /// Number of epochs
    pub epochs: usize,
    /// Generator learning rate
    pub gen_lr: f64,
    /// Discriminator learning rate
    pub disc_lr: f64,
    /// Adam first moment decay
    pub beta1: f64,
    /// Adam second moment decay
    pub beta2: f64,
    /// L2 weight decay applied by Adam
    pub weight_decay: f64,
    /// Checkpoint save frequency in epochs
    pub checkpoint_every: usize,
    /// Checkpoint directory
    pub checkpoint_dir: String,
    /// Preview image frequency in epochs
    pub preview_every: usize,
    /// Preview grid rows
    pub preview_rows: usize,
    /// Preview grid columns
    pub preview_cols: usize,
    /// Seed for the preview latent batch and libtorch
    pub seed: u64,
    /// Device: "cpu" or "cuda"
    pub device: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: ModelConfig {
                n_hidden: 100,
                bottom_width: 4,
                ch: 512,
                wscale: 0.02,
                noise_sigma: 0.2,
            },
            data: DataConfig {
                source: DataSource::Cifar10,
                path: "data/cifar-10-batches-bin".to_string(),
                batch_size: 50,
                max_images: None,
            },
            training: TrainingConfigFile {
                epochs: 100,
                gen_lr: 2e-4,
                disc_lr: 2e-4,
                beta1: 0.5,
                beta2: 0.999,
                weight_decay: 1e-4,
                checkpoint_every: 10,
                checkpoint_dir: "checkpoints".to_string(),
                preview_every: 1,
                preview_rows: 10,
                preview_cols: 10,
                seed: 0,
                device: "cpu".to_string(),
            },
        }
    }
}

impl Config {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from TOML file
    pub fn from_toml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Save configuration to TOML file
    pub fn save_toml<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load configuration from JSON file
    pub fn from_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save configuration to JSON file
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load from TOML or JSON depending on extension
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let config = if is_toml(path) {
            Self::from_toml(path)?
        } else {
            Self::from_json(path)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Save as TOML or JSON depending on extension
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if is_toml(path) {
            self.save_toml(path)
        } else {
            self.save_json(path)
        }
    }

    /// Get device from configuration
    pub fn get_device(&self) -> tch::Device {
        match self.training.device.to_lowercase().as_str() {
            "cuda" | "gpu" => {
                if tch::Cuda::is_available() {
                    tch::Device::Cuda(0)
                } else {
                    tracing::warn!("CUDA requested but not available, falling back to CPU");
                    tch::Device::Cpu
                }
            }
            _ => tch::Device::Cpu,
        }
    }

    /// Generator hyperparameters
    pub fn generator_config(&self) -> GeneratorConfig {
        GeneratorConfig {
            n_hidden: self.model.n_hidden,
            bottom_width: self.model.bottom_width,
            ch: self.model.ch,
            wscale: self.model.wscale,
        }
    }

    /// Discriminator hyperparameters
    pub fn discriminator_config(&self) -> DiscriminatorConfig {
        DiscriminatorConfig {
            bottom_width: self.model.bottom_width,
            ch: self.model.ch,
            wscale: self.model.wscale,
            noise_sigma: self.model.noise_sigma,
        }
    }

    /// Trainer settings
    pub fn training_config(&self) -> TrainingConfig {
        let t = &self.training;
        TrainingConfig {
            epochs: t.epochs,
            gen_lr: t.gen_lr,
            disc_lr: t.disc_lr,
            adam: AdamSettings {
                beta1: t.beta1,
                beta2: t.beta2,
                weight_decay: t.weight_decay,
            },
            checkpoint_every: t.checkpoint_every,
            checkpoint_dir: t.checkpoint_dir.clone(),
            preview_every: t.preview_every,
            preview_rows: t.preview_rows,
            preview_cols: t.preview_cols,
            seed: t.seed,
        }
    }

    /// Side length of images the model produces and consumes
    pub fn image_size(&self) -> i64 {
        self.model.bottom_width * 8
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let m = &self.model;
        if m.n_hidden <= 0 {
            return Err(invalid("n_hidden must be > 0"));
        }
        if m.bottom_width <= 0 {
            return Err(invalid("bottom_width must be > 0"));
        }
        if m.ch < 8 || m.ch % 8 != 0 {
            return Err(invalid("ch must be a positive multiple of 8"));
        }
        if m.wscale <= 0.0 {
            return Err(invalid("wscale must be > 0"));
        }
        if m.noise_sigma < 0.0 {
            return Err(invalid("noise_sigma must be >= 0"));
        }
        if self.data.batch_size == 0 {
            return Err(invalid("batch_size must be > 0"));
        }
        if self.data.max_images == Some(0) {
            return Err(invalid("max_images must be > 0 when set"));
        }

        let t = &self.training;
        if t.epochs == 0 {
            return Err(invalid("epochs must be > 0"));
        }
        if t.gen_lr <= 0.0 || t.disc_lr <= 0.0 {
            return Err(invalid("learning rates must be > 0"));
        }
        if t.checkpoint_every == 0 || t.preview_every == 0 {
            return Err(invalid("checkpoint_every and preview_every must be > 0"));
        }
        if t.preview_rows == 0 || t.preview_cols == 0 {
            return Err(invalid("preview grid must have at least one cell"));
        }
        Ok(())
    }
}

fn invalid(msg: &str) -> Error {
    Error::InvalidConfig(msg.to_string())
}

fn is_toml(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("toml")
}

/// Load the configuration at `path`, writing the default first if missing
pub fn ensure_config_exists<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path = path.as_ref();
    if path.exists() {
        Config::load(path)
    } else {
        let config = Config::default();
        config.save(path)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.model.n_hidden, 100);
        assert_eq!(config.image_size(), 32);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_toml_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.data.source = DataSource::ImageDir;
        config.data.max_images = Some(500);
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_config_json_roundtrip() {
        let config = Config::default();
        let json = serde_json::to_string(&config).unwrap();
        let loaded: Config = serde_json::from_str(&json).unwrap();

        assert_eq!(config, loaded);
        assert!(json.contains("\"cifar10\""));
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        config.model.ch = 100;
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        let mut config = Config::default();
        config.data.batch_size = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.data.max_images = Some(0);
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
        config.data.max_images = Some(1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_ensure_config_exists_creates_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let created = ensure_config_exists(&path).unwrap();
        assert!(path.exists());
        assert_eq!(ensure_config_exists(&path).unwrap(), created);
    }

    #[test]
    fn test_derived_network_configs_agree() {
        let config = Config::default();
        let gen = config.generator_config();
        let disc = config.discriminator_config();

        assert_eq!(gen.bottom_width, disc.bottom_width);
        assert_eq!(gen.ch, disc.ch);
        assert_eq!(config.training_config().adam.beta1, 0.5);
    }
}
