//! Checkpoint save/load utilities
//!
//! A checkpoint is a directory `checkpoint_epoch_NNNN` holding both weight
//! files, a `meta.json` describing the networks and a `metrics.csv`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{DiscriminatorConfig, GeneratorConfig, DCGAN};
use crate::training::TrainingMetrics;

const CHECKPOINT_PREFIX: &str = "checkpoint_epoch_";
const GENERATOR_FILE: &str = "generator.pt";
const DISCRIMINATOR_FILE: &str = "discriminator.pt";
const META_FILE: &str = "meta.json";
const METRICS_FILE: &str = "metrics.csv";

/// Checkpoint metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointMeta {
    /// Epochs completed
    pub epoch: usize,
    /// Generator loss at checkpoint
    pub gen_loss: f64,
    /// Discriminator loss at checkpoint
    pub disc_loss: f64,
    /// RFC 3339 timestamp of checkpoint
    pub timestamp: String,
    /// Generator hyperparameters
    pub generator: GeneratorConfig,
    /// Discriminator hyperparameters
    pub discriminator: DiscriminatorConfig,
}

/// Path of the generator weights inside a checkpoint directory
pub fn generator_path<P: AsRef<Path>>(checkpoint_dir: P) -> PathBuf {
    checkpoint_dir.as_ref().join(GENERATOR_FILE)
}

/// Path of the discriminator weights inside a checkpoint directory
pub fn discriminator_path<P: AsRef<Path>>(checkpoint_dir: P) -> PathBuf {
    checkpoint_dir.as_ref().join(DISCRIMINATOR_FILE)
}

/// Save a complete checkpoint (model + metadata + metrics)
///
/// # Returns
///
/// Path to the checkpoint directory
pub fn save_checkpoint<P: AsRef<Path>>(
    model: &DCGAN,
    metrics: &TrainingMetrics,
    epoch: usize,
    dir: P,
) -> Result<PathBuf> {
    let checkpoint_dir = dir
        .as_ref()
        .join(format!("{}{:04}", CHECKPOINT_PREFIX, epoch));
    std::fs::create_dir_all(&checkpoint_dir)?;

    model.save(
        generator_path(&checkpoint_dir),
        discriminator_path(&checkpoint_dir),
    )?;

    let meta = CheckpointMeta {
        epoch,
        gen_loss: metrics.latest_gen_loss().unwrap_or(0.0),
        disc_loss: metrics.latest_disc_loss().unwrap_or(0.0),
        timestamp: chrono::Utc::now().to_rfc3339(),
        generator: model.generator.config().clone(),
        discriminator: model.discriminator.config().clone(),
    };
    let meta_json = serde_json::to_string_pretty(&meta)?;
    std::fs::write(checkpoint_dir.join(META_FILE), meta_json)?;

    metrics.save_csv(checkpoint_dir.join(METRICS_FILE))?;

    tracing::info!("Saved checkpoint to {}", checkpoint_dir.display());
    Ok(checkpoint_dir)
}

/// Load checkpoint metadata
pub fn load_checkpoint_meta<P: AsRef<Path>>(checkpoint_dir: P) -> Result<CheckpointMeta> {
    let content = std::fs::read_to_string(checkpoint_dir.as_ref().join(META_FILE))?;
    Ok(serde_json::from_str(&content)?)
}

/// Load a complete checkpoint into an existing model
///
/// # Returns
///
/// Tuple of (epoch, metrics)
pub fn load_checkpoint<P: AsRef<Path>>(
    model: &mut DCGAN,
    checkpoint_dir: P,
) -> Result<(usize, TrainingMetrics)> {
    let checkpoint_dir = checkpoint_dir.as_ref();
    model.load(
        generator_path(checkpoint_dir),
        discriminator_path(checkpoint_dir),
    )?;

    let meta = load_checkpoint_meta(checkpoint_dir)?;

    let metrics_path = checkpoint_dir.join(METRICS_FILE);
    let metrics = if metrics_path.exists() {
        TrainingMetrics::load_csv(&metrics_path)?
    } else {
        TrainingMetrics::new()
    };

    tracing::info!(
        "Loaded checkpoint from {} (epoch {})",
        checkpoint_dir.display(),
        meta.epoch
    );
    Ok((meta.epoch, metrics))
}

/// Rebuild a model from a checkpoint's metadata and load its weights
pub fn restore_model<P: AsRef<Path>>(
    checkpoint_dir: P,
    device: tch::Device,
) -> Result<(DCGAN, CheckpointMeta)> {
    let checkpoint_dir = checkpoint_dir.as_ref();
    let meta = load_checkpoint_meta(checkpoint_dir)?;

    let mut model = DCGAN::new(meta.generator.clone(), meta.discriminator.clone(), device)?;
    model.load(
        generator_path(checkpoint_dir),
        discriminator_path(checkpoint_dir),
    )?;

    Ok((model, meta))
}

fn checkpoint_dirs(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return vec![];
    };

    let mut dirs: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .filter(|e| {
            e.file_name()
                .to_str()
                .map(|n| n.starts_with(CHECKPOINT_PREFIX))
                .unwrap_or(false)
        })
        .map(|e| e.path())
        .collect();

    dirs.sort();
    dirs
}

/// Find the latest checkpoint in a directory
pub fn find_latest_checkpoint<P: AsRef<Path>>(dir: P) -> Option<PathBuf> {
    checkpoint_dirs(dir.as_ref()).pop()
}

/// List all readable checkpoints in a directory, oldest first
pub fn list_checkpoints<P: AsRef<Path>>(dir: P) -> Vec<(PathBuf, CheckpointMeta)> {
    checkpoint_dirs(dir.as_ref())
        .into_iter()
        .filter_map(|path| load_checkpoint_meta(&path).ok().map(|meta| (path, meta)))
        .collect()
}
