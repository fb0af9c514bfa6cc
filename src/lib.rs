//! # DCGAN with latent space exploration
//!
//! A Deep Convolutional Generative Adversarial Network for small RGB images,
//! built on `tch`, together with helpers that sample and traverse the latent
//! space for visualization.
//!
//! ## Modules
//!
//! - `model`: Generator, Discriminator and the DCGAN wrapper
//! - `latent`: latent vector sampling, sweeps, walks and pans
//! - `training`: Training loop, losses and metrics
//! - `data`: Image datasets and batching
//! - `utils`: Configuration, checkpoints and image grids

pub mod data;
pub mod error;
pub mod latent;
pub mod model;
pub mod training;
pub mod utils;

pub use data::{DataLoader, ImageDataset};
pub use error::{Error, Result};
pub use latent::{make_hidden, pan_hidden, show_hidden, walk_hidden};
pub use model::{Discriminator, DiscriminatorConfig, Generator, GeneratorConfig, DCGAN};
pub use training::{Trainer, TrainingConfig, TrainingMetrics};
pub use utils::{load_checkpoint, save_checkpoint, save_grid, Config};
