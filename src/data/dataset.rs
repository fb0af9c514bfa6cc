//! Image datasets for GAN training
//!
//! Images are held in host memory as `(N, 3, H, W)` arrays scaled to `[0, 1]`,
//! matching the sigmoid output range of the generator.

use std::path::{Path, PathBuf};

use ndarray::{s, Array4};
use tch::{Kind, Tensor};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::utils::tensor_to_array4;

/// File extensions picked up by `ImageDataset::from_dir`
const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// In-memory image dataset
#[derive(Debug, Clone)]
pub struct ImageDataset {
    images: Array4<f32>,
}

impl ImageDataset {
    /// Wrap an existing `(N, 3, H, W)` array
    pub fn new(images: Array4<f32>) -> Result<Self> {
        if images.shape()[0] == 0 {
            return Err(Error::EmptyDataset("no images in array".to_string()));
        }
        if images.shape()[1] != 3 {
            return Err(Error::mismatch("image channels", 3, images.shape()[1]));
        }
        Ok(Self { images })
    }

    /// Load the CIFAR-10 training split from its binary batch files
    pub fn cifar10<P: AsRef<Path>>(dir: P) -> Result<Self> {
        info!("Loading CIFAR-10 from {}", dir.as_ref().display());
        let dataset = tch::vision::cifar::load_dir(dir)?;
        let images = tensor_to_array4(&dataset.train_images)?;
        info!("Loaded {} CIFAR-10 images", images.shape()[0]);
        Self::new(images)
    }

    /// Load every png/jpg image in `dir`, resized to `size x size`
    pub fn from_dir<P: AsRef<Path>>(dir: P, size: i64) -> Result<Self> {
        let dir = dir.as_ref();
        let paths = list_images(dir)?;
        if paths.is_empty() {
            return Err(Error::EmptyDataset(format!(
                "no png/jpg images found in {}",
                dir.display()
            )));
        }

        info!("Loading {} images from {}", paths.len(), dir.display());

        let mut tensors = Vec::with_capacity(paths.len());
        for path in &paths {
            match tch::vision::image::load_and_resize(path, size, size) {
                Ok(image) => tensors.push(image),
                Err(e) => warn!("Skipping {}: {}", path.display(), e),
            }
        }
        if tensors.is_empty() {
            return Err(Error::EmptyDataset(format!(
                "no readable images in {}",
                dir.display()
            )));
        }

        let batch = Tensor::stack(&tensors, 0).to_kind(Kind::Float) / 255.0;
        debug!("Stacked image batch {:?}", batch.size());

        Self::new(tensor_to_array4(&batch)?)
    }

    /// Number of images
    pub fn len(&self) -> usize {
        self.images.shape()[0]
    }

    /// Whether the dataset has no images
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Height and width of every image
    pub fn image_size(&self) -> (usize, usize) {
        (self.images.shape()[2], self.images.shape()[3])
    }

    /// Keep only the first `n` images
    pub fn truncate(self, n: usize) -> Self {
        let n = n.clamp(1, self.len());
        Self {
            images: self.images.slice(s![..n, .., .., ..]).to_owned(),
        }
    }

    /// Consume the dataset and return its array
    pub fn into_images(self) -> Array4<f32> {
        self.images
    }
}

fn list_images(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
                .unwrap_or(false)
        })
        .collect();

    paths.sort();
    Ok(paths)
}
