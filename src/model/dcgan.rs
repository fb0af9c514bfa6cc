//! DCGAN wrapper combining Generator and Discriminator
//!
//! Owns one variable store per network so that each side gets its own
//! optimizer and checkpoint file.

use std::path::Path;

use ndarray::Array4;
use rand::Rng;
use tch::{nn, nn::OptimizerConfig, nn::VarStore, Device, Tensor};

use super::discriminator::{Discriminator, DiscriminatorConfig};
use super::generator::{Generator, GeneratorConfig};
use crate::error::{Error, Result};

/// Adam settings used for both networks
#[derive(Debug, Clone, Copy)]
pub struct AdamSettings {
    pub beta1: f64,
    pub beta2: f64,
    pub weight_decay: f64,
}

impl Default for AdamSettings {
    fn default() -> Self {
        Self {
            beta1: 0.5,
            beta2: 0.999,
            weight_decay: 1e-4,
        }
    }
}

/// Complete DCGAN model
pub struct DCGAN {
    /// Generator network
    pub generator: Generator,
    /// Discriminator network
    pub discriminator: Discriminator,
    /// Variable store for generator
    pub gen_vs: VarStore,
    /// Variable store for discriminator
    pub disc_vs: VarStore,
    /// Device (CPU/GPU)
    pub device: Device,
}

impl DCGAN {
    /// Create a new DCGAN model
    ///
    /// Both configs must agree on `bottom_width`, otherwise generated images
    /// would not fit the discriminator.
    pub fn new(
        gen_config: GeneratorConfig,
        disc_config: DiscriminatorConfig,
        device: Device,
    ) -> Result<Self> {
        if gen_config.bottom_width != disc_config.bottom_width {
            return Err(Error::InvalidConfig(format!(
                "generator bottom_width {} != discriminator bottom_width {}",
                gen_config.bottom_width, disc_config.bottom_width
            )));
        }

        let gen_vs = VarStore::new(device);
        let disc_vs = VarStore::new(device);

        let generator = Generator::new(&gen_vs.root(), gen_config);
        let discriminator = Discriminator::new(&disc_vs.root(), disc_config);

        Ok(Self {
            generator,
            discriminator,
            gen_vs,
            disc_vs,
            device,
        })
    }

    /// Create DCGAN with default layer sizes for a latent dimension
    ///
    /// # Arguments
    ///
    /// * `n_hidden` - Size of latent vector
    /// * `bottom_width` - Spatial size of the deepest feature map
    /// * `ch` - Channel count of the deepest feature map
    /// * `device` - Device to create model on
    pub fn with_defaults(n_hidden: i64, bottom_width: i64, ch: i64, device: Device) -> Result<Self> {
        let gen_config = GeneratorConfig {
            n_hidden,
            bottom_width,
            ch,
            ..Default::default()
        };

        let disc_config = DiscriminatorConfig {
            bottom_width,
            ch,
            ..Default::default()
        };

        Self::new(gen_config, disc_config, device)
    }

    /// Generate `num_samples` images from fresh uniform latent codes
    ///
    /// # Returns
    ///
    /// Tensor of shape (num_samples, 3, image_size, image_size)
    pub fn generate<R: Rng + ?Sized>(&self, num_samples: usize, rng: &mut R) -> Result<Tensor> {
        let latent = self.generator.make_hidden(num_samples, rng)?;
        Ok(self.generate_from_latent(&latent))
    }

    /// Generate images from a prepared latent batch
    pub fn generate_from_latent(&self, latent: &Array4<f32>) -> Tensor {
        self.generator.generate(latent, self.device)
    }

    /// Discriminate samples (get probability of being real)
    pub fn discriminate(&self, samples: &Tensor) -> Tensor {
        self.discriminator.classify(samples)
    }

    fn adam(settings: AdamSettings) -> nn::Adam {
        nn::Adam {
            beta1: settings.beta1,
            beta2: settings.beta2,
            wd: settings.weight_decay,
            ..Default::default()
        }
    }

    /// Get generator optimizer
    pub fn gen_optimizer(&self, lr: f64, settings: AdamSettings) -> Result<nn::Optimizer> {
        Ok(Self::adam(settings).build(&self.gen_vs, lr)?)
    }

    /// Get discriminator optimizer
    pub fn disc_optimizer(&self, lr: f64, settings: AdamSettings) -> Result<nn::Optimizer> {
        Ok(Self::adam(settings).build(&self.disc_vs, lr)?)
    }

    /// Save model weights
    pub fn save<P: AsRef<Path>>(&self, gen_path: P, disc_path: P) -> Result<()> {
        self.gen_vs.save(gen_path)?;
        self.disc_vs.save(disc_path)?;
        Ok(())
    }

    /// Load model weights
    pub fn load<P: AsRef<Path>>(&mut self, gen_path: P, disc_path: P) -> Result<()> {
        self.gen_vs.load(gen_path)?;
        self.disc_vs.load(disc_path)?;
        Ok(())
    }

    /// Get latent dimension
    pub fn n_hidden(&self) -> usize {
        self.generator.n_hidden()
    }

    /// Side length of generated images
    pub fn image_size(&self) -> i64 {
        self.generator.config().image_size()
    }
}
