//! Integration tests for the DCGAN latent explorer

use ndarray::Array4;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tch::{Device, Kind};

use rust_dcgan_latent::data::{DataLoader, ImageDataset};
use rust_dcgan_latent::training::{Trainer, TrainingConfig};
use rust_dcgan_latent::utils::{find_latest_checkpoint, list_checkpoints, restore_model, save_grid};
use rust_dcgan_latent::{latent, Config, Error, DCGAN};

/// Small network: 16x16 images, 16 channels at the bottom
fn small_config(checkpoint_dir: &str) -> Config {
    let mut config = Config::default();
    config.model.n_hidden = 8;
    config.model.bottom_width = 2;
    config.model.ch = 16;
    config.data.batch_size = 4;
    config.training.epochs = 2;
    config.training.checkpoint_every = 1;
    config.training.checkpoint_dir = checkpoint_dir.to_string();
    config.training.preview_rows = 2;
    config.training.preview_cols = 2;
    config
}

/// Images with a bright left half, so there is something to learn
fn synthetic_dataset(n: usize, size: usize) -> ImageDataset {
    let images = Array4::from_shape_fn((n, 3, size, size), |(i, c, _, w)| {
        let base = if w < size / 2 { 0.9 } else { 0.1 };
        base + 0.01 * ((i + c) % 5) as f32
    });
    ImageDataset::new(images).unwrap()
}

#[test]
fn test_output_size_is_eight_times_bottom_width() {
    for bottom_width in [1, 2, 3] {
        let model = DCGAN::with_defaults(4, bottom_width, 16, Device::Cpu).unwrap();
        let mut rng = StdRng::seed_from_u64(0);

        let images = model.generate(2, &mut rng).unwrap();
        let side = bottom_width * 8;
        assert_eq!(images.size(), vec![2, 3, side, side]);
        assert_eq!(model.discriminate(&images).size(), vec![2, 1]);
    }
}

#[test]
fn test_training_writes_checkpoints_and_previews() {
    let dir = tempfile::tempdir().unwrap();
    let checkpoint_dir = dir.path().to_string_lossy().to_string();
    let config = small_config(&checkpoint_dir);
    config.validate().unwrap();

    let mut model = DCGAN::new(
        config.generator_config(),
        config.discriminator_config(),
        Device::Cpu,
    )
    .unwrap();
    let mut loader = DataLoader::new(synthetic_dataset(12, 16), 4, true, true);

    let mut trainer = Trainer::new(config.training_config());
    let metrics = trainer.train(&mut model, &mut loader).unwrap();

    assert_eq!(metrics.num_epochs(), 2);
    assert!(metrics.gen_losses.iter().all(|l| l.is_finite()));
    assert!(metrics
        .disc_real_acc
        .iter()
        .all(|a| (0.0..=1.0).contains(a)));

    assert_eq!(list_checkpoints(dir.path()).len(), 2);
    assert!(dir.path().join("preview").join("image_epoch_0002.png").exists());
    assert!(dir.path().join("training_metrics.csv").exists());

    let latest = find_latest_checkpoint(dir.path()).unwrap();
    let (restored, meta) = restore_model(&latest, Device::Cpu).unwrap();
    assert_eq!(meta.epoch, 2);

    let sweep = latent::show_hidden(8, 4, 0).unwrap();
    let a = model.generate_from_latent(&sweep);
    let b = restored.generate_from_latent(&sweep);
    assert!(a.allclose(&b, 1e-5, 1e-5, false));
}

#[test]
fn test_resumed_training_continues_epoch_numbering() {
    let dir = tempfile::tempdir().unwrap();
    let checkpoint_dir = dir.path().to_string_lossy().to_string();
    let mut config = small_config(&checkpoint_dir);
    config.training.epochs = 1;

    let mut model = DCGAN::new(
        config.generator_config(),
        config.discriminator_config(),
        Device::Cpu,
    )
    .unwrap();
    let mut loader = DataLoader::new(synthetic_dataset(8, 16), 4, false, true);

    let mut first = Trainer::new(config.training_config());
    let metrics = first.train(&mut model, &mut loader).unwrap().clone();

    let mut second = Trainer::new(config.training_config()).resume_from(1, metrics);
    let metrics = second.train(&mut model, &mut loader).unwrap();

    assert_eq!(metrics.num_epochs(), 2);
    let epochs: Vec<usize> = list_checkpoints(dir.path())
        .iter()
        .map(|(_, meta)| meta.epoch)
        .collect();
    assert_eq!(epochs, vec![1, 2]);
}

#[test]
fn test_latent_strips_render() {
    let dir = tempfile::tempdir().unwrap();
    let model = DCGAN::with_defaults(6, 2, 16, Device::Cpu).unwrap();
    let generator = &model.generator;

    let show = generator.show_hidden(5, 2).unwrap();
    let pan = generator.pan_hidden(5, 4).unwrap();

    let mut rng = StdRng::seed_from_u64(11);
    let start: Vec<f32> = generator.make_hidden(1, &mut rng).unwrap().iter().copied().collect();
    let end: Vec<f32> = generator.make_hidden(1, &mut rng).unwrap().iter().copied().collect();
    let walk = generator.walk_hidden(5, &start, &end).unwrap();

    for (name, latent) in [("show", show), ("pan", pan), ("walk", walk)] {
        let images = model.generate_from_latent(&latent);
        assert_eq!(images.size(), vec![5, 3, 16, 16]);

        let path = dir.path().join(format!("{}.png", name));
        save_grid(&images, 1, 5, &path).unwrap();
        assert!(path.exists());
    }
}

#[test]
fn test_walk_endpoints_reproduce_direct_samples() {
    let model = DCGAN::with_defaults(6, 2, 16, Device::Cpu).unwrap();
    let mut rng = StdRng::seed_from_u64(5);

    let codes = model.generator.make_hidden(2, &mut rng).unwrap();
    let start: Vec<f32> = codes.slice(ndarray::s![0, .., 0, 0]).to_vec();
    let end: Vec<f32> = codes.slice(ndarray::s![1, .., 0, 0]).to_vec();

    let walk = model.generator.walk_hidden(3, &start, &end).unwrap();
    let walked = model.generate_from_latent(&walk);
    let direct = model.generate_from_latent(&codes);

    assert!(walked.get(0).allclose(&direct.get(0), 1e-5, 1e-6, false));
    assert!(walked.get(2).allclose(&direct.get(1), 1e-5, 1e-6, false));
}

#[test]
fn test_latent_errors_surface_through_generator() {
    let model = DCGAN::with_defaults(6, 2, 16, Device::Cpu).unwrap();

    assert!(matches!(
        model.generator.show_hidden(1, 0),
        Err(Error::InvalidBatchSize { .. })
    ));
    assert!(matches!(
        model.generator.pan_hidden(4, 5),
        Err(Error::LatentIndexOutOfRange { .. })
    ));
    assert!(matches!(
        model.generator.walk_hidden(4, &[0.0; 6], &[0.0; 2]),
        Err(Error::DimensionMismatch { .. })
    ));
}

#[test]
fn test_discriminator_noise_changes_training_scores_only() {
    let model = DCGAN::with_defaults(4, 2, 16, Device::Cpu).unwrap();
    let x = tch::Tensor::rand([3, 3, 16, 16], (Kind::Float, Device::Cpu));

    let eval_a = model.discriminator.forward_t(&x, false);
    let eval_b = model.discriminator.forward_t(&x, false);
    assert!(eval_a.allclose(&eval_b, 1e-6, 1e-6, false));

    let train_a = model.discriminator.forward_t(&x, true);
    let train_b = model.discriminator.forward_t(&x, true);
    assert!(!train_a.allclose(&train_b, 0.0, 0.0, false));
}
