//! Generator network for DCGAN
//!
//! The Generator maps latent vectors to RGB images.
//! A dense projection seeds a `bottom_width x bottom_width` feature map which
//! three stride-2 deconvolutions upsample by 8x before a final 3x3 deconvolution
//! produces three sigmoid channels.

use ndarray::Array4;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tch::{nn, nn::Module, Device, Tensor};

use crate::error::Result;
use crate::latent;

/// Generator network configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Size of the latent vector
    pub n_hidden: i64,
    /// Spatial size of the first feature map
    pub bottom_width: i64,
    /// Channels of the first feature map, halved by each upsampling stage
    pub ch: i64,
    /// Standard deviation of the normal weight initializer
    pub wscale: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            n_hidden: 100,
            bottom_width: 4,
            ch: 512,
            wscale: 0.02,
        }
    }
}

impl GeneratorConfig {
    /// Side length of generated images
    pub fn image_size(&self) -> i64 {
        self.bottom_width * 8
    }
}

/// Weight initializer shared by every layer of both networks
pub(crate) fn normal_init(wscale: f64) -> nn::Init {
    nn::Init::Randn {
        mean: 0.0,
        stdev: wscale,
    }
}

/// Generator network
///
/// Architecture:
/// 1. Linear `n_hidden -> bw * bw * ch`, ReLU, reshape
/// 2. Three Deconvolution(k4, s2, p1) + ReLU stages: `ch -> ch/2 -> ch/4 -> ch/8`
/// 3. Deconvolution(k3, s1, p1) `ch/8 -> 3` with Sigmoid
#[derive(Debug)]
pub struct Generator {
    config: GeneratorConfig,
    l0: nn::Linear,
    dc1: nn::ConvTranspose2D,
    dc2: nn::ConvTranspose2D,
    dc3: nn::ConvTranspose2D,
    dc4: nn::ConvTranspose2D,
}

impl Generator {
    /// Create a new Generator network
    pub fn new(vs: &nn::Path, config: GeneratorConfig) -> Self {
        let ch = config.ch;
        let bw = config.bottom_width;
        let w = normal_init(config.wscale);

        let linear_config = nn::LinearConfig {
            ws_init: w,
            bs_init: Some(nn::Init::Const(0.0)),
            bias: true,
        };
        let l0 = nn::linear(vs / "l0", config.n_hidden, bw * bw * ch, linear_config);

        let up_config = nn::ConvTransposeConfig {
            stride: 2,
            padding: 1,
            ws_init: w,
            bs_init: nn::Init::Const(0.0),
            ..Default::default()
        };
        let dc1 = nn::conv_transpose2d(vs / "dc1", ch, ch / 2, 4, up_config);
        let dc2 = nn::conv_transpose2d(vs / "dc2", ch / 2, ch / 4, 4, up_config);
        let dc3 = nn::conv_transpose2d(vs / "dc3", ch / 4, ch / 8, 4, up_config);

        let out_config = nn::ConvTransposeConfig {
            stride: 1,
            padding: 1,
            ws_init: w,
            bs_init: nn::Init::Const(0.0),
            ..Default::default()
        };
        let dc4 = nn::conv_transpose2d(vs / "dc4", ch / 8, 3, 3, out_config);

        Self {
            config,
            l0,
            dc1,
            dc2,
            dc3,
            dc4,
        }
    }

    /// Forward pass
    ///
    /// # Arguments
    ///
    /// * `z` - Latent tensor of shape (batch, n_hidden) or (batch, n_hidden, 1, 1)
    ///
    /// # Returns
    ///
    /// Tensor of shape (batch, 3, 8 * bottom_width, 8 * bottom_width) in (0, 1)
    pub fn forward(&self, z: &Tensor) -> Tensor {
        let batch_size = z.size()[0];
        let bw = self.config.bottom_width;

        let z = z.flatten(1, -1);
        let h = self
            .l0
            .forward(&z)
            .relu()
            .view([batch_size, self.config.ch, bw, bw]);

        let h = self.dc1.forward(&h).relu();
        let h = self.dc2.forward(&h).relu();
        let h = self.dc3.forward(&h).relu();

        self.dc4.forward(&h).sigmoid()
    }

    /// Generate images from a latent batch produced by the `latent` helpers
    pub fn generate(&self, latent: &Array4<f32>, device: Device) -> Tensor {
        let z = latent::to_tensor(latent, device);
        tch::no_grad(|| self.forward(&z))
    }

    /// Uniform random latent codes sized for this generator
    pub fn make_hidden<R: Rng + ?Sized>(&self, batch_size: usize, rng: &mut R) -> Result<Array4<f32>> {
        latent::make_hidden(self.n_hidden(), batch_size, rng)
    }

    /// Sweep a single latent dimension from -2 to 2
    pub fn show_hidden(&self, batch_size: usize, index: usize) -> Result<Array4<f32>> {
        latent::show_hidden(self.n_hidden(), batch_size, index)
    }

    /// Linear walk between two latent codes
    pub fn walk_hidden(&self, batch_size: usize, start: &[f32], end: &[f32]) -> Result<Array4<f32>> {
        latent::walk_hidden(self.n_hidden(), batch_size, start, end)
    }

    /// Quarter circle through dimensions `index` and `index + 1`
    pub fn pan_hidden(&self, batch_size: usize, index: usize) -> Result<Array4<f32>> {
        latent::pan_hidden(self.n_hidden(), batch_size, index)
    }

    /// Latent dimension as a `usize`
    pub fn n_hidden(&self) -> usize {
        self.config.n_hidden as usize
    }

    /// Get configuration
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }
}

impl Module for Generator {
    fn forward(&self, xs: &Tensor) -> Tensor {
        Generator::forward(self, xs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tch::nn::VarStore;

    fn small_config() -> GeneratorConfig {
        GeneratorConfig {
            n_hidden: 10,
            bottom_width: 2,
            ch: 16,
            wscale: 0.02,
        }
    }

    #[test]
    fn test_generator_output_shape() {
        let vs = VarStore::new(Device::Cpu);
        let gen = Generator::new(&vs.root(), small_config());

        let z = Tensor::rand([4, 10, 1, 1], (tch::Kind::Float, Device::Cpu));
        let output = gen.forward(&z);

        assert_eq!(output.size(), vec![4, 3, 16, 16]);
    }

    #[test]
    fn test_generator_accepts_flat_latent() {
        let vs = VarStore::new(Device::Cpu);
        let gen = Generator::new(&vs.root(), small_config());

        let z = Tensor::rand([2, 10], (tch::Kind::Float, Device::Cpu));
        assert_eq!(gen.forward(&z).size(), vec![2, 3, 16, 16]);
    }

    #[test]
    fn test_generator_output_range() {
        let vs = VarStore::new(Device::Cpu);
        let gen = Generator::new(&vs.root(), small_config());

        let mut rng = StdRng::seed_from_u64(1);
        let latent = gen.make_hidden(3, &mut rng).unwrap();
        let images = gen.generate(&latent, Device::Cpu);

        let min_val = images.min().double_value(&[]);
        let max_val = images.max().double_value(&[]);
        assert!(min_val >= 0.0 && max_val <= 1.0);
    }

    #[test]
    fn test_generator_latent_helpers_use_n_hidden() {
        let vs = VarStore::new(Device::Cpu);
        let gen = Generator::new(&vs.root(), small_config());

        assert_eq!(gen.show_hidden(5, 9).unwrap().shape(), &[5, 10, 1, 1]);
        assert!(gen.show_hidden(5, 10).is_err());
        assert!(gen.pan_hidden(5, 9).is_err());
    }

    #[test]
    fn test_generator_weight_init() {
        let vs = VarStore::new(Device::Cpu);
        let config = GeneratorConfig {
            n_hidden: 100,
            bottom_width: 4,
            ch: 64,
            wscale: 0.02,
        };
        let _gen = Generator::new(&vs.root(), config);
        let variables = vs.variables();

        let dc1 = &variables["dc1.weight"];
        let std = dc1.std(true).double_value(&[]);
        assert!((std - 0.02).abs() < 0.002, "dc1.weight std = {}", std);
        assert!(dc1.mean(tch::Kind::Float).double_value(&[]).abs() < 0.002);

        let l0_std = variables["l0.weight"].std(true).double_value(&[]);
        assert!((l0_std - 0.02).abs() < 0.002, "l0.weight std = {}", l0_std);

        let biases: Vec<_> = variables.iter().filter(|(name, _)| name.ends_with("bias")).collect();
        assert_eq!(biases.len(), 5);
        for (name, bias) in biases {
            let total = bias.abs().sum(tch::Kind::Float).double_value(&[]);
            assert_eq!(total, 0.0, "{} is not zero", name);
        }
    }

    #[test]
    fn test_image_size() {
        assert_eq!(GeneratorConfig::default().image_size(), 32);
    }
}
