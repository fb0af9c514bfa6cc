//! DCGAN image generation and latent space exploration
//!
//! Main entry point providing CLI interface for:
//! - Training the DCGAN on CIFAR-10 or a directory of images
//! - Sampling image grids from a checkpoint
//! - Sweeping, walking and panning through the latent space

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use rust_dcgan_latent::{
    data::{DataLoader, ImageDataset},
    latent,
    model::DCGAN,
    training::Trainer,
    utils::{
        ensure_config_exists, find_latest_checkpoint, list_checkpoints, load_checkpoint,
        restore_model, save_grid, Config, DataSource,
    },
};

/// DCGAN for small RGB images with latent space tools
#[derive(Parser)]
#[command(name = "dcgan_latent")]
#[command(version = "0.1.0")]
#[command(about = "Train a DCGAN and explore its latent space")]
struct Cli {
    /// Path to configuration file (.toml or .json)
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Verbosity level
    #[arg(short, long, default_value = "info")]
    verbosity: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize default configuration file
    Init {
        /// Output configuration file path
        #[arg(short, long, default_value = "config.toml")]
        output: String,
    },

    /// Train the DCGAN model
    Train {
        /// Dataset directory (overrides config)
        #[arg(short, long)]
        data: Option<String>,

        /// Dataset format (overrides config)
        #[arg(long, value_enum)]
        source: Option<DataSource>,

        /// Number of epochs (overrides config)
        #[arg(short, long)]
        epochs: Option<usize>,

        /// Resume from checkpoint directory
        #[arg(long)]
        resume: Option<String>,
    },

    /// Sample a grid of images from random latent codes
    Generate {
        /// Checkpoint directory (defaults to the latest one)
        #[arg(short, long)]
        model: Option<String>,

        /// Grid rows
        #[arg(long, default_value = "10")]
        rows: usize,

        /// Grid columns
        #[arg(long, default_value = "10")]
        cols: usize,

        /// Latent sampling seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Output image path
        #[arg(short, long, default_value = "generated.png")]
        output: String,
    },

    /// Sweep one latent dimension from -2 to 2
    Show {
        /// Checkpoint directory (defaults to the latest one)
        #[arg(short, long)]
        model: Option<String>,

        /// Latent dimension to sweep
        #[arg(short, long)]
        index: usize,

        /// Number of images in the strip
        #[arg(short, long, default_value = "10")]
        steps: usize,

        /// Output image path
        #[arg(short, long, default_value = "show.png")]
        output: String,
    },

    /// Walk in a straight line between two random latent codes
    Walk {
        /// Checkpoint directory (defaults to the latest one)
        #[arg(short, long)]
        model: Option<String>,

        /// Seed of the starting code
        #[arg(long, default_value = "0")]
        start_seed: u64,

        /// Seed of the final code
        #[arg(long, default_value = "1")]
        end_seed: u64,

        /// Number of images in the strip
        #[arg(short, long, default_value = "10")]
        steps: usize,

        /// Output image path
        #[arg(short, long, default_value = "walk.png")]
        output: String,
    },

    /// Pan a quarter circle through latent dimensions index and index + 1
    Pan {
        /// Checkpoint directory (defaults to the latest one)
        #[arg(short, long)]
        model: Option<String>,

        /// First of the two latent dimensions
        #[arg(short, long)]
        index: usize,

        /// Number of images in the strip
        #[arg(short, long, default_value = "10")]
        steps: usize,

        /// Output image path
        #[arg(short, long, default_value = "pan.png")]
        output: String,
    },

    /// List saved checkpoints
    Checkpoints,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = match cli.verbosity.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Init { output } => init_config(&output)?,
        Commands::Train {
            data,
            source,
            epochs,
            resume,
        } => {
            let mut config = load_config(&cli.config)?;
            if let Some(data) = data {
                config.data.path = data;
            }
            if let Some(source) = source {
                config.data.source = source;
            }
            if let Some(epochs) = epochs {
                config.training.epochs = epochs;
            }
            config.validate()?;
            train_model(&config, resume)?;
        }
        Commands::Generate {
            model,
            rows,
            cols,
            seed,
            output,
        } => {
            let config = load_config(&cli.config)?;
            let dcgan = open_model(&config, model)?;
            let mut rng = StdRng::seed_from_u64(seed);
            let latent = dcgan.generator.make_hidden(rows * cols, &mut rng)?;
            write_images(&dcgan, &latent, rows, cols, &output)?;
        }
        Commands::Show {
            model,
            index,
            steps,
            output,
        } => {
            let config = load_config(&cli.config)?;
            let dcgan = open_model(&config, model)?;
            let latent = dcgan.generator.show_hidden(steps, index)?;
            write_images(&dcgan, &latent, 1, steps, &output)?;
        }
        Commands::Walk {
            model,
            start_seed,
            end_seed,
            steps,
            output,
        } => {
            let config = load_config(&cli.config)?;
            let dcgan = open_model(&config, model)?;
            let n_hidden = dcgan.n_hidden();

            let start = latent::make_hidden(n_hidden, 1, &mut StdRng::seed_from_u64(start_seed))?;
            let end = latent::make_hidden(n_hidden, 1, &mut StdRng::seed_from_u64(end_seed))?;
            let start: Vec<f32> = start.iter().copied().collect();
            let end: Vec<f32> = end.iter().copied().collect();

            let latent = dcgan.generator.walk_hidden(steps, &start, &end)?;
            write_images(&dcgan, &latent, 1, steps, &output)?;
        }
        Commands::Pan {
            model,
            index,
            steps,
            output,
        } => {
            let config = load_config(&cli.config)?;
            let dcgan = open_model(&config, model)?;
            let latent = dcgan.generator.pan_hidden(steps, index)?;
            write_images(&dcgan, &latent, 1, steps, &output)?;
        }
        Commands::Checkpoints => {
            let config = load_config(&cli.config)?;
            print_checkpoints(&config);
        }
    }

    Ok(())
}

/// Load configuration, falling back to defaults when the file is missing
fn load_config(path: &str) -> Result<Config> {
    if Path::new(path).exists() {
        Config::load(path).with_context(|| format!("reading config {}", path))
    } else {
        info!("Config file {} not found, using defaults", path);
        Ok(Config::default())
    }
}

/// Initialize default configuration file
fn init_config(output_path: &str) -> Result<()> {
    if Path::new(output_path).exists() {
        anyhow::bail!("{} already exists", output_path);
    }
    ensure_config_exists(output_path)?;
    info!("Created default configuration at {}", output_path);
    Ok(())
}

/// Train the DCGAN model
fn train_model(config: &Config, resume: Option<String>) -> Result<()> {
    let device = config.get_device();
    info!("Using device: {:?}", device);
    tch::manual_seed(config.training.seed as i64);

    let dataset = match config.data.source {
        DataSource::Cifar10 => ImageDataset::cifar10(&config.data.path)?,
        DataSource::ImageDir => ImageDataset::from_dir(&config.data.path, config.image_size())?,
    };
    let dataset = match config.data.max_images {
        Some(n) => dataset.truncate(n),
        None => dataset,
    };
    info!("Training on {} images", dataset.len());

    let mut data_loader = DataLoader::new(dataset, config.data.batch_size, true, true);

    let mut model = DCGAN::new(
        config.generator_config(),
        config.discriminator_config(),
        device,
    )?;
    info!(
        "Created DCGAN: n_hidden={}, ch={}, image_size={}",
        config.model.n_hidden,
        config.model.ch,
        model.image_size()
    );

    let mut trainer = Trainer::new(config.training_config());
    if let Some(checkpoint_path) = resume {
        let (epoch, metrics) = load_checkpoint(&mut model, &checkpoint_path)?;
        info!("Resumed from epoch {}", epoch);
        trainer = trainer.resume_from(epoch, metrics);
    }

    let metrics = trainer.train(&mut model, &mut data_loader)?;

    info!(
        "Training complete. Final G_loss: {:.4}, D_loss: {:.4}",
        metrics.latest_gen_loss().unwrap_or(0.0),
        metrics.latest_disc_loss().unwrap_or(0.0)
    );

    Ok(())
}

/// Restore a model from an explicit or the latest checkpoint
fn open_model(config: &Config, model: Option<String>) -> Result<DCGAN> {
    let checkpoint: PathBuf = match model {
        Some(path) => PathBuf::from(path),
        None => find_latest_checkpoint(&config.training.checkpoint_dir).with_context(|| {
            format!(
                "no checkpoints found in {}",
                config.training.checkpoint_dir
            )
        })?,
    };

    let (dcgan, meta) = restore_model(&checkpoint, config.get_device())?;
    info!(
        "Loaded generator from {} (epoch {})",
        checkpoint.display(),
        meta.epoch
    );
    Ok(dcgan)
}

/// Render a latent batch and write it as a grid
fn write_images(
    dcgan: &DCGAN,
    latent: &ndarray::Array4<f32>,
    rows: usize,
    cols: usize,
    output: &str,
) -> Result<()> {
    let images = dcgan.generate_from_latent(latent);
    save_grid(&images, rows as i64, cols as i64, output)?;
    info!("Saved {} images to {}", rows * cols, output);
    Ok(())
}

/// Print saved checkpoints with their losses
fn print_checkpoints(config: &Config) {
    let checkpoints = list_checkpoints(&config.training.checkpoint_dir);
    if checkpoints.is_empty() {
        println!("No checkpoints in {}", config.training.checkpoint_dir);
        return;
    }

    println!("{:<40} {:>6} {:>10} {:>10}", "checkpoint", "epoch", "G_loss", "D_loss");
    for (path, meta) in checkpoints {
        println!(
            "{:<40} {:>6} {:>10.4} {:>10.4}",
            path.display(),
            meta.epoch,
            meta.gen_loss,
            meta.disc_loss
        );
    }
}
