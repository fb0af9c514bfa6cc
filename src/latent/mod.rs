//! Latent space sampling and traversal
//!
//! Every helper returns a batch of latent vectors shaped
//! `(batch_size, n_hidden, 1, 1)`, the layout the generator consumes:
//! - `make_hidden`: uniform random codes for training and sampling
//! - `show_hidden`: sweep a single dimension from -2 to 2
//! - `walk_hidden`: straight line between two codes
//! - `pan_hidden`: quarter circle of radius 4 in a pair of dimensions

use std::f64::consts::FRAC_PI_2;

use ndarray::Array4;
use ndarray_rand::RandomExt;
use rand::Rng;
use rand_distr::Uniform;
use tch::{Device, Tensor};

use crate::error::{Error, Result};
use crate::utils::array4_to_tensor;

/// Sweep range used by `show_hidden`
const SWEEP_EXTENT: f64 = 2.0;
/// Radius of the arc traced by `pan_hidden`
const PAN_RADIUS: f64 = 4.0;

fn check_sweep_batch(batch_size: usize) -> Result<()> {
    if batch_size < 2 {
        return Err(Error::InvalidBatchSize {
            got: batch_size,
            min: 2,
        });
    }
    Ok(())
}

fn check_index(index: usize, n_hidden: usize) -> Result<()> {
    if index >= n_hidden {
        return Err(Error::LatentIndexOutOfRange { index, n_hidden });
    }
    Ok(())
}

/// Sample `batch_size` latent codes uniformly from `[-1, 1)`
pub fn make_hidden<R: Rng + ?Sized>(
    n_hidden: usize,
    batch_size: usize,
    rng: &mut R,
) -> Result<Array4<f32>> {
    if batch_size == 0 {
        return Err(Error::InvalidBatchSize { got: 0, min: 1 });
    }

    Ok(Array4::random_using(
        (batch_size, n_hidden, 1, 1),
        Uniform::new(-1.0f32, 1.0f32),
        rng,
    ))
}

/// Sweep dimension `index` linearly from -2 to 2, all others zero
///
/// Row `k` holds `4 * k / (batch_size - 1) - 2` at `index`.
pub fn show_hidden(n_hidden: usize, batch_size: usize, index: usize) -> Result<Array4<f32>> {
    check_sweep_batch(batch_size)?;
    check_index(index, n_hidden)?;

    let step = 1.0 / (batch_size - 1) as f64;
    let mut latent = Array4::<f32>::zeros((batch_size, n_hidden, 1, 1));

    for k in 0..batch_size {
        let value = 2.0 * SWEEP_EXTENT * step * k as f64 - SWEEP_EXTENT;
        latent[[k, index, 0, 0]] = value as f32;
    }

    Ok(latent)
}

/// Linear walk from `start` to `end` in `batch_size` evenly spaced steps
///
/// The first row equals `start` and the last equals `end`.
pub fn walk_hidden(
    n_hidden: usize,
    batch_size: usize,
    start: &[f32],
    end: &[f32],
) -> Result<Array4<f32>> {
    check_sweep_batch(batch_size)?;
    if start.len() != n_hidden {
        return Err(Error::mismatch("walk_hidden start", n_hidden, start.len()));
    }
    if end.len() != n_hidden {
        return Err(Error::mismatch("walk_hidden end", n_hidden, end.len()));
    }

    let denom = (batch_size - 1) as f64;
    let mut latent = Array4::<f32>::zeros((batch_size, n_hidden, 1, 1));

    for k in 0..batch_size {
        let t = k as f64 / denom;
        for (dim, (&a, &b)) in start.iter().zip(end.iter()).enumerate() {
            let (a, b) = (a as f64, b as f64);
            latent[[k, dim, 0, 0]] = (a + (b - a) * t) as f32;
        }
    }

    Ok(latent)
}

/// Trace a quarter circle of radius 4 in dimensions `index` and `index + 1`
///
/// Row `k` sits at angle `(pi / 2) * k / (batch_size - 1)`, so the walk starts
/// on the `index` axis and ends on the `index + 1` axis.
pub fn pan_hidden(n_hidden: usize, batch_size: usize, index: usize) -> Result<Array4<f32>> {
    check_sweep_batch(batch_size)?;
    // The arc needs both `index` and `index + 1`
    if index.checked_add(1).filter(|&next| next < n_hidden).is_none() {
        return Err(Error::LatentIndexOutOfRange { index, n_hidden });
    }

    let step = FRAC_PI_2 / (batch_size - 1) as f64;
    let mut latent = Array4::<f32>::zeros((batch_size, n_hidden, 1, 1));

    for k in 0..batch_size {
        let theta = step * k as f64;
        latent[[k, index, 0, 0]] = (PAN_RADIUS * theta.cos()) as f32;
        latent[[k, index + 1, 0, 0]] = (PAN_RADIUS * theta.sin()) as f32;
    }

    Ok(latent)
}

/// Copy a latent batch into a float tensor on `device`
pub fn to_tensor(latent: &Array4<f32>, device: Device) -> Tensor {
    array4_to_tensor(latent, device)
}
