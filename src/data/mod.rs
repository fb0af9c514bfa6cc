//! Data module for loading training images
//!
//! This module provides:
//! - CIFAR-10 and image directory datasets
//! - DataLoader for batching images

mod dataset;
mod loader;

pub use dataset::ImageDataset;
pub use loader::{DataLoader, DataLoaderIter};
