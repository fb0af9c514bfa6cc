//! Loss functions for GAN training
//!
//! Softplus form of the non-saturating GAN objective, computed on raw
//! discriminator logits.

use tch::{Kind, Tensor};

/// Generator loss: mean(softplus(-D(G(z))))
///
/// Equal to binary cross entropy against "real" targets; minimized when the
/// discriminator scores generated images as real.
///
/// # Arguments
///
/// * `fake_output` - Discriminator logits on generated samples
///
/// # Returns
///
/// Scalar loss tensor
pub fn generator_loss(fake_output: &Tensor) -> Tensor {
    (-fake_output).softplus().mean(Kind::Float)
}

/// Discriminator loss: mean(softplus(-D(x))) + mean(softplus(D(G(z))))
///
/// # Arguments
///
/// * `real_output` - Discriminator logits on real samples
/// * `fake_output` - Discriminator logits on generated samples
///
/// # Returns
///
/// Scalar loss tensor
pub fn discriminator_loss(real_output: &Tensor, fake_output: &Tensor) -> Tensor {
    let real_loss = (-real_output).softplus().mean(Kind::Float);
    let fake_loss = fake_output.softplus().mean(Kind::Float);

    real_loss + fake_loss
}

/// Fraction of real samples scored as real and of fakes scored as fake
pub fn discriminator_accuracy(real_output: &Tensor, fake_output: &Tensor) -> (f64, f64) {
    // sigmoid(y) >= 0.5 exactly when y >= 0
    let real_acc = real_output.ge(0.0).to_kind(Kind::Float).mean(Kind::Float);
    let fake_acc = fake_output.lt(0.0).to_kind(Kind::Float).mean(Kind::Float);

    (real_acc.double_value(&[]), fake_acc.double_value(&[]))
}
