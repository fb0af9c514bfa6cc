//! Model module containing GAN architecture components
//!
//! This module provides:
//! - Generator network mapping latent vectors to images
//! - Discriminator network with training-time instance noise
//! - DCGAN wrapper combining both networks

mod dcgan;
mod discriminator;
mod generator;

pub use dcgan::{AdamSettings, DCGAN};
pub use discriminator::{add_noise, Discriminator, DiscriminatorConfig};
pub use generator::{Generator, GeneratorConfig};
