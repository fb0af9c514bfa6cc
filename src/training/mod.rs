//! Training module for DCGAN
//!
//! This module provides:
//! - Training loop implementation
//! - Softplus adversarial losses
//! - Training configuration and metrics

mod losses;
mod metrics;
mod trainer;

pub use losses::{discriminator_accuracy, discriminator_loss, generator_loss};
pub use metrics::TrainingMetrics;
pub use trainer::{StepStats, Trainer, TrainingConfig};
