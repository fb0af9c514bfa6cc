//! Discriminator network for DCGAN
//!
//! The Discriminator scores images as real or generated.
//! Pairs of 3x3 (stride 1) and 4x4 (stride 2) convolutions halve the spatial
//! size three times, every activation is perturbed with Gaussian instance
//! noise during training, and a linear layer produces one logit per image.

use serde::{Deserialize, Serialize};
use tch::{nn, nn::Module, nn::ModuleT, Tensor};

use super::generator::normal_init;

/// Slope of the negative half of LeakyReLU
const LEAKY_SLOPE: f64 = 0.2;

/// Discriminator network configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscriminatorConfig {
    /// Spatial size after the three downsampling stages
    pub bottom_width: i64,
    /// Channels of the deepest feature map
    pub ch: i64,
    /// Standard deviation of the normal weight initializer
    pub wscale: f64,
    /// Standard deviation of the training-time instance noise
    pub noise_sigma: f64,
}

impl Default for DiscriminatorConfig {
    fn default() -> Self {
        Self {
            bottom_width: 4,
            ch: 512,
            wscale: 0.02,
            noise_sigma: 0.2,
        }
    }
}

/// Add `sigma * N(0, 1)` noise in training mode, identity otherwise
pub fn add_noise(h: &Tensor, sigma: f64, train: bool) -> Tensor {
    if train && sigma > 0.0 {
        h + h.randn_like() * sigma
    } else {
        h.shallow_clone()
    }
}

fn leaky_relu(h: &Tensor) -> Tensor {
    h.maximum(&(h * LEAKY_SLOPE))
}

/// Discriminator network
///
/// Architecture:
/// 1. Seven convolutions, each followed by instance noise and LeakyReLU(0.2)
/// 2. Flatten and Linear `bw * bw * ch -> 1`
#[derive(Debug)]
pub struct Discriminator {
    config: DiscriminatorConfig,
    convs: Vec<nn::Conv2D>,
    l4: nn::Linear,
}

impl Discriminator {
    /// Create a new Discriminator network
    pub fn new(vs: &nn::Path, config: DiscriminatorConfig) -> Self {
        let ch = config.ch;
        let bw = config.bottom_width;
        let w = normal_init(config.wscale);

        let same = nn::ConvConfig {
            stride: 1,
            padding: 1,
            ws_init: w,
            bs_init: nn::Init::Const(0.0),
            ..Default::default()
        };
        let down = nn::ConvConfig {
            stride: 2,
            ..same
        };

        // (name, in, out, kernel, config)
        let layout = [
            ("c0_0", 3, ch / 8, 3, same),
            ("c0_1", ch / 8, ch / 4, 4, down),
            ("c1_0", ch / 4, ch / 4, 3, same),
            ("c1_1", ch / 4, ch / 2, 4, down),
            ("c2_0", ch / 2, ch / 2, 3, same),
            ("c2_1", ch / 2, ch, 4, down),
            ("c3_0", ch, ch, 3, same),
        ];

        let convs = layout
            .into_iter()
            .map(|(name, c_in, c_out, k, cfg)| nn::conv2d(vs / name, c_in, c_out, k, cfg))
            .collect();

        let linear_config = nn::LinearConfig {
            ws_init: w,
            bs_init: Some(nn::Init::Const(0.0)),
            bias: true,
        };
        let l4 = nn::linear(vs / "l4", bw * bw * ch, 1, linear_config);

        Self { config, convs, l4 }
    }

    /// Forward pass
    ///
    /// # Arguments
    ///
    /// * `x` - Images of shape (batch, 3, 8 * bottom_width, 8 * bottom_width)
    /// * `train` - Whether instance noise is applied
    ///
    /// # Returns
    ///
    /// Tensor of shape (batch, 1) with logits (not sigmoid)
    pub fn forward_t(&self, x: &Tensor, train: bool) -> Tensor {
        let sigma = self.config.noise_sigma;

        let mut h = add_noise(x, sigma, train);
        for conv in &self.convs {
            h = leaky_relu(&add_noise(&conv.forward(&h), sigma, train));
        }

        self.l4.forward(&h.flatten(1, -1))
    }

    /// Classify samples (inference mode)
    ///
    /// Returns probability of being real (after sigmoid)
    pub fn classify(&self, x: &Tensor) -> Tensor {
        tch::no_grad(|| self.forward_t(x, false).sigmoid())
    }

    /// Get configuration
    pub fn config(&self) -> &DiscriminatorConfig {
        &self.config
    }
}

impl ModuleT for Discriminator {
    fn forward_t(&self, xs: &Tensor, train: bool) -> Tensor {
        Discriminator::forward_t(self, xs, train)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use tch::{nn::VarStore, Device, Kind};

    fn small_config() -> DiscriminatorConfig {
        DiscriminatorConfig {
            bottom_width: 2,
            ch: 16,
            wscale: 0.02,
            noise_sigma: 0.2,
        }
    }

    #[test]
    fn test_discriminator_output_shape() {
        let vs = VarStore::new(Device::Cpu);
        let disc = Discriminator::new(&vs.root(), small_config());

        let input = Tensor::rand([4, 3, 16, 16], (Kind::Float, Device::Cpu));
        let output = disc.forward_t(&input, true);

        assert_eq!(output.size(), vec![4, 1]);
    }

    #[test]
    fn test_discriminator_eval_is_deterministic() {
        let vs = VarStore::new(Device::Cpu);
        let disc = Discriminator::new(&vs.root(), small_config());

        let input = Tensor::rand([2, 3, 16, 16], (Kind::Float, Device::Cpu));
        let a = disc.forward_t(&input, false);
        let b = disc.forward_t(&input, false);

        assert!(a.allclose(&b, 1e-6, 1e-6, false));
    }

    #[test]
    fn test_discriminator_classify() {
        let vs = VarStore::new(Device::Cpu);
        let disc = Discriminator::new(&vs.root(), small_config());

        let input = Tensor::rand([2, 3, 16, 16], (Kind::Float, Device::Cpu));
        let probs = disc.classify(&input);

        // Probabilities should be in [0, 1]
        let min_val: f64 = probs.min().double_value(&[]);
        let max_val: f64 = probs.max().double_value(&[]);
        assert!(min_val >= 0.0 && max_val <= 1.0);
    }

    #[test]
    fn test_discriminator_weight_init() {
        let vs = VarStore::new(Device::Cpu);
        let config = DiscriminatorConfig {
            bottom_width: 4,
            ch: 64,
            wscale: 0.02,
            noise_sigma: 0.2,
        };
        let _disc = Discriminator::new(&vs.root(), config);
        let variables = vs.variables();

        // c0_0 only has 8 * 3 * 3 * 3 weights, so its estimate is looser
        for (name, tolerance) in [("c0_0.weight", 0.005), ("c3_0.weight", 0.002), ("l4.weight", 0.002)] {
            let std = variables[name].std(true).double_value(&[]);
            assert!((std - 0.02).abs() < tolerance, "{} std = {}", name, std);
        }

        let biases: Vec<_> = variables.iter().filter(|(name, _)| name.ends_with("bias")).collect();
        assert_eq!(biases.len(), 8);
        for (name, bias) in biases {
            let total = bias.abs().sum(Kind::Float).double_value(&[]);
            assert_eq!(total, 0.0, "{} is not zero", name);
        }
    }

    #[test]
    fn test_add_noise_only_in_training() {
        let h = Tensor::zeros([64, 64], (Kind::Float, Device::Cpu));

        let eval = add_noise(&h, 0.2, false);
        assert_eq!(eval.abs().sum(Kind::Float).double_value(&[]), 0.0);

        let noisy = add_noise(&h, 0.2, true);
        let std = noisy.std(true).double_value(&[]);
        assert!((std - 0.2).abs() < 0.02);
    }

    #[test]
    fn test_leaky_relu_slope() {
        let h = Tensor::from_slice(&[-1.0f32, 0.0, 2.0]);
        let out = leaky_relu(&h);

        let values: Vec<f32> = Vec::try_from(&out).unwrap();
        for (got, want) in values.iter().zip([-0.2f32, 0.0, 2.0]) {
            assert_abs_diff_eq!(*got, want, epsilon = 1e-6);
        }
    }
}
