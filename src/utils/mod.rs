//! Utility module with helper functions
//!
//! This module provides:
//! - Configuration handling
//! - Checkpoint save/load utilities
//! - Image grid visualization
//! - ndarray/tensor conversions

mod checkpoint;
mod config;
mod tensor;
mod visualize;

pub use checkpoint::{
    discriminator_path, find_latest_checkpoint, generator_path, list_checkpoints,
    load_checkpoint, load_checkpoint_meta, restore_model, save_checkpoint, CheckpointMeta,
};
pub use config::{ensure_config_exists, Config, DataConfig, DataSource, ModelConfig, TrainingConfigFile};
pub use tensor::{array4_to_tensor, tensor_to_array4};
pub use visualize::{save_grid, tile_images};
