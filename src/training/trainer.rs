//! Training loop implementation for DCGAN
//!
//! Alternates one discriminator update on real vs. generated images with one
//! generator update, writing preview grids and checkpoints along the way.

use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};
use ndarray::Array4;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tch::{nn, Tensor};
use tracing::{info, warn};

use super::losses::{discriminator_accuracy, discriminator_loss, generator_loss};
use super::metrics::TrainingMetrics;
use crate::data::DataLoader;
use crate::error::{Error, Result};
use crate::model::{AdamSettings, DCGAN};
use crate::utils::{array4_to_tensor, save_checkpoint, save_grid};

/// Training configuration
#[derive(Debug, Clone)]
pub struct TrainingConfig {
    /// Number of training epochs
    pub epochs: usize,
    /// Learning rate for generator
    pub gen_lr: f64,
    /// Learning rate for discriminator
    pub disc_lr: f64,
    /// Adam moments and weight decay
    pub adam: AdamSettings,
    /// Save checkpoint every N epochs
    pub checkpoint_every: usize,
    /// Directory to save checkpoints and previews
    pub checkpoint_dir: String,
    /// Write a preview grid every N epochs
    pub preview_every: usize,
    /// Preview grid rows
    pub preview_rows: usize,
    /// Preview grid columns
    pub preview_cols: usize,
    /// Seed for the training latents and the fixed preview batch
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs: 100,
            gen_lr: 2e-4,
            disc_lr: 2e-4,
            adam: AdamSettings::default(),
            checkpoint_every: 10,
            checkpoint_dir: "checkpoints".to_string(),
            preview_every: 1,
            preview_rows: 10,
            preview_cols: 10,
            seed: 0,
        }
    }
}

/// Losses and accuracies of a single update
#[derive(Debug, Clone, Copy)]
pub struct StepStats {
    pub gen_loss: f64,
    pub disc_loss: f64,
    pub real_acc: f64,
    pub fake_acc: f64,
}

/// DCGAN Trainer
pub struct Trainer {
    config: TrainingConfig,
    metrics: TrainingMetrics,
    rng: StdRng,
    start_epoch: usize,
}

impl Trainer {
    /// Create a new trainer
    pub fn new(config: TrainingConfig) -> Self {
        let rng = training_rng(config.seed, 0);
        Self {
            config,
            metrics: TrainingMetrics::new(),
            rng,
            start_epoch: 0,
        }
    }

    /// Continue numbering and metrics from a restored checkpoint
    pub fn resume_from(mut self, epoch: usize, metrics: TrainingMetrics) -> Self {
        self.start_epoch = epoch;
        self.metrics = metrics;
        self.rng = training_rng(self.config.seed, epoch);
        self
    }

    /// Fixed latent batch shown in every preview grid
    ///
    /// Drawn from `seed` itself, while training latents come from
    /// `seed + 1 + start_epoch`, so previews are never training inputs.
    fn preview_latent(&self, model: &DCGAN) -> Result<Array4<f32>> {
        let count = self.config.preview_rows * self.config.preview_cols;
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        model.generator.make_hidden(count, &mut rng)
    }

    fn preview_path(&self, epoch: usize) -> PathBuf {
        Path::new(&self.config.checkpoint_dir)
            .join("preview")
            .join(format!("image_epoch_{:04}.png", epoch))
    }

    /// Train the DCGAN model
    ///
    /// # Arguments
    ///
    /// * `model` - DCGAN model to train
    /// * `data_loader` - DataLoader providing image batches
    ///
    /// # Returns
    ///
    /// Training metrics
    pub fn train(&mut self, model: &mut DCGAN, data_loader: &mut DataLoader) -> Result<&TrainingMetrics> {
        if self.config.checkpoint_every == 0 || self.config.preview_every == 0 {
            return Err(Error::InvalidConfig(
                "checkpoint_every and preview_every must be > 0".to_string(),
            ));
        }

        let expected = model.image_size() as usize;
        let (h, w) = data_loader.image_size();
        if (h, w) != (expected, expected) {
            return Err(Error::mismatch("training image size", expected, h.max(w)));
        }

        let mut gen_opt = model.gen_optimizer(self.config.gen_lr, self.config.adam)?;
        let mut disc_opt = model.disc_optimizer(self.config.disc_lr, self.config.adam)?;

        let num_batches = data_loader.num_batches();
        if num_batches == 0 {
            return Err(Error::EmptyDataset(format!(
                "{} images cannot fill a batch of {}",
                data_loader.num_samples(),
                data_loader.batch_size()
            )));
        }

        let preview_latent = self.preview_latent(model)?;

        info!(
            "Starting training for {} epochs, {} batches per epoch",
            self.config.epochs, num_batches
        );

        std::fs::create_dir_all(&self.config.checkpoint_dir)?;

        let first = self.start_epoch + 1;
        let last = self.start_epoch + self.config.epochs;

        for epoch in first..=last {
            let mut totals = StepStats {
                gen_loss: 0.0,
                disc_loss: 0.0,
                real_acc: 0.0,
                fake_acc: 0.0,
            };
            let mut batch_count = 0usize;

            let pb = ProgressBar::new(num_batches as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("##-"),
            );

            for real_batch in data_loader.iter() {
                let real_data = array4_to_tensor(&real_batch, model.device);
                let stats = self.train_step(model, &real_data, &mut gen_opt, &mut disc_opt)?;

                totals.gen_loss += stats.gen_loss;
                totals.disc_loss += stats.disc_loss;
                totals.real_acc += stats.real_acc;
                totals.fake_acc += stats.fake_acc;
                batch_count += 1;

                pb.set_message(format!("G: {:.4}, D: {:.4}", stats.gen_loss, stats.disc_loss));
                pb.inc(1);
            }

            pb.finish_with_message("done");

            let n = batch_count.max(1) as f64;
            let avg = StepStats {
                gen_loss: totals.gen_loss / n,
                disc_loss: totals.disc_loss / n,
                real_acc: totals.real_acc / n,
                fake_acc: totals.fake_acc / n,
            };
            self.metrics
                .record_epoch(avg.gen_loss, avg.disc_loss, avg.real_acc, avg.fake_acc);

            info!(
                "Epoch {}/{}: G_loss={:.4}, D_loss={:.4}, Real_acc={:.2}%, Fake_acc={:.2}%",
                epoch,
                last,
                avg.gen_loss,
                avg.disc_loss,
                avg.real_acc * 100.0,
                avg.fake_acc * 100.0
            );

            if self.metrics.check_mode_collapse(10) {
                warn!("Possible mode collapse detected! Consider adjusting learning rates.");
            }

            if epoch % self.config.preview_every == 0 {
                self.write_preview(model, &preview_latent, epoch);
            }

            if epoch % self.config.checkpoint_every == 0 {
                if let Err(e) = save_checkpoint(model, &self.metrics, epoch, &self.config.checkpoint_dir) {
                    warn!("Failed to save checkpoint: {}", e);
                }
            }
        }

        // Final model always lands in a checkpoint
        if last % self.config.checkpoint_every != 0 {
            save_checkpoint(model, &self.metrics, last, &self.config.checkpoint_dir)?;
        }

        let metrics_path = Path::new(&self.config.checkpoint_dir).join("training_metrics.csv");
        if let Err(e) = self.metrics.save_csv(&metrics_path) {
            warn!("Failed to save metrics: {}", e);
        }

        Ok(&self.metrics)
    }

    /// One discriminator update followed by one generator update
    pub fn train_step(
        &mut self,
        model: &mut DCGAN,
        real_data: &Tensor,
        gen_opt: &mut nn::Optimizer,
        disc_opt: &mut nn::Optimizer,
    ) -> Result<StepStats> {
        let batch_size = real_data.size()[0] as usize;

        // ========== Train Discriminator ==========
        let z = self.sample_latent(model, batch_size)?;
        let fake_data = model.generator.forward(&z);

        let real_output = model.discriminator.forward_t(real_data, true);
        let fake_output = model.discriminator.forward_t(&fake_data.detach(), true);

        let d_loss = discriminator_loss(&real_output, &fake_output);
        disc_opt.zero_grad();
        d_loss.backward();
        disc_opt.step();

        let (real_acc, fake_acc) = discriminator_accuracy(&real_output, &fake_output);

        // ========== Train Generator ==========
        let z = self.sample_latent(model, batch_size)?;
        let fake_data = model.generator.forward(&z);
        let fake_output = model.discriminator.forward_t(&fake_data, true);

        let g_loss = generator_loss(&fake_output);
        gen_opt.zero_grad();
        g_loss.backward();
        gen_opt.step();

        Ok(StepStats {
            gen_loss: g_loss.double_value(&[]),
            disc_loss: d_loss.double_value(&[]),
            real_acc,
            fake_acc,
        })
    }

    fn sample_latent(&mut self, model: &DCGAN, batch_size: usize) -> Result<Tensor> {
        let latent = model.generator.make_hidden(batch_size, &mut self.rng)?;
        Ok(array4_to_tensor(&latent, model.device))
    }

    fn write_preview(&self, model: &DCGAN, latent: &Array4<f32>, epoch: usize) {
        let images = model.generate_from_latent(latent);
        let path = self.preview_path(epoch);
        let rows = self.config.preview_rows as i64;
        let cols = self.config.preview_cols as i64;

        match save_grid(&images, rows, cols, &path) {
            Ok(()) => info!("Wrote preview {}", path.display()),
            Err(e) => warn!("Failed to write preview: {}", e),
        }
    }

    /// Get training metrics
    pub fn metrics(&self) -> &TrainingMetrics {
        &self.metrics
    }

    /// Get configuration
    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }
}

/// Latent stream for a run starting after `start_epoch` completed epochs
fn training_rng(seed: u64, start_epoch: usize) -> StdRng {
    StdRng::seed_from_u64(seed.wrapping_add(1).wrapping_add(start_epoch as u64))
}
