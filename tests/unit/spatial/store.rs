//! Tests for the durable world store

#[cfg(test)]
mod tests {
    use hypertile::io::configuration::{
        BootstrapKernel, IMAGE_DIR, SamplerConfig, WORLD_META_FILE, WORLD_TABLE_FILE,
    };
    use hypertile::io::error::{ErrorCategory, HypertileError};
    use hypertile::spatial::store::{WorldMetadata, WorldStateStore};
    use hypertile::spatial::tiles::Tile;
    use image::RgbaImage;
    use std::path::Path;

    fn config(dir: &Path) -> SamplerConfig {
        SamplerConfig {
            latent_dim: 2,
            image_size: 2,
            ..SamplerConfig::default()
        }
        .with_store_dir(dir)
    }

    fn batch(first: u64, count: u64) -> (Vec<Tile>, Vec<RgbaImage>) {
        let tiles = (first..first + count)
            .map(|index| {
                let value = index as f64;
                Tile::new(index, [value, -value], vec![0.1 * value, 1.0 / 3.0])
            })
            .collect();
        let images = (0..count).map(|_| RgbaImage::new(2, 2)).collect();
        (tiles, images)
    }

    // Tests opening a new store records metadata and starts empty
    // Verified by deferring metadata until the first commit
    #[test]
    fn test_open_new_store() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path().join("world");
        let store = WorldStateStore::open(&config(&root)).expect("open");

        assert!(store.world().is_empty());
        assert!(root.join(WORLD_META_FILE).exists());
        assert!(!store.table_path().exists());
        assert_eq!(store.root(), root.as_path());
        assert_eq!(store.image_dir(), root.join(IMAGE_DIR));
        assert_eq!(store.metadata().latent_dim, 2);
    }

    // Tests committed tiles survive reopening bit for bit
    // Verified by writing latents with fixed precision
    #[test]
    fn test_commit_and_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = config(dir.path());
        let mut store = WorldStateStore::open(&config).expect("open");

        let (tiles, images) = batch(0, 3);
        let paths = store.commit(tiles.clone(), &images).expect("commit");
        assert_eq!(paths.len(), 3);
        assert!(paths.iter().all(|path| path.exists()));
        assert!(dir.path().join(WORLD_TABLE_FILE).exists());

        let (more, more_images) = batch(3, 2);
        store.commit(more, &more_images).expect("second commit");

        let reopened = WorldStateStore::open(&config).expect("reopen");
        assert_eq!(reopened.world().len(), 5);
        assert_eq!(&reopened.world().tiles()[..3], tiles.as_slice());
        assert_eq!(reopened.world(), store.world());
    }

    // Tests reopening with different hyperparameters fails
    // Verified by overwriting stored metadata on open
    #[test]
    fn test_hyperparameter_guard() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = config(dir.path());
        WorldStateStore::open(&config).expect("open");

        let mut alpha = config.clone();
        alpha.hyperparameters.alpha = 0.5;
        let error = WorldStateStore::open(&alpha).expect_err("alpha changed");
        assert!(matches!(
            error,
            HypertileError::Configuration {
                parameter: "alpha",
                ..
            }
        ));

        let mut dimension = config.clone();
        dimension.latent_dim = 3;
        assert!(WorldStateStore::open(&dimension).is_err());

        let mut kernel = config;
        kernel.bootstrap_kernel = BootstrapKernel::Lengthscale;
        assert!(WorldStateStore::open(&kernel).is_err());
    }

    // Tests metadata comparison is exact
    // Verified by comparing with a tolerance
    #[test]
    fn test_metadata_matches_exactly() {
        let dir = tempfile::tempdir().expect("tempdir");
        let base = WorldMetadata::from_config(&config(dir.path()));
        assert!(base.ensure_matches(&base).is_ok());

        let mut nudged = base;
        nudged.hyperparameters.sigma = f64::from_bits(base.hyperparameters.sigma.to_bits() + 1);
        assert!(base.ensure_matches(&nudged).is_err());
    }

    // Tests invalid batches write nothing
    // Verified by saving images before validating tiles
    #[test]
    fn test_commit_rejects_invalid_batch() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = WorldStateStore::open(&config(dir.path())).expect("open");

        let (tiles, images) = batch(1, 2);
        let error = store.commit(tiles, &images).expect_err("gap");
        assert_eq!(error.category(), ErrorCategory::InvalidState);
        assert!(!store.image_dir().exists());

        let (tiles, mut images) = batch(0, 2);
        images.pop();
        assert!(store.commit(tiles, &images).is_err());
        assert!(store.world().is_empty());

        assert!(store.commit(Vec::new(), &[]).expect("empty").is_empty());
    }

    // Tests a failed table write removes the batch images
    // Verified by leaving images of the failed batch on disk
    #[test]
    fn test_commit_rolls_back_images() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = WorldStateStore::open(&config(dir.path())).expect("open");
        let (tiles, images) = batch(0, 1);
        store.commit(tiles, &images).expect("commit");

        std::fs::create_dir(dir.path().join(format!("{WORLD_TABLE_FILE}.tmp")))
            .expect("block temporary table");
        let (tiles, images) = batch(1, 2);
        let error = store.commit(tiles, &images).expect_err("table write fails");

        assert_eq!(error.category(), ErrorCategory::Persistence);
        assert_eq!(store.world().len(), 1);
        let remaining = std::fs::read_dir(store.image_dir())
            .expect("image dir")
            .count();
        assert_eq!(remaining, 1);

        store.reload().expect("reload");
        assert_eq!(store.world().len(), 1);
    }

    // Tests corrupt tables are reported with their line
    // Verified by skipping malformed rows
    #[test]
    fn test_corrupt_table() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = config(dir.path());
        WorldStateStore::open(&config).expect("open");
        std::fs::write(
            dir.path().join(WORLD_TABLE_FILE),
            "tile_index,tile_x,tile_y,latent_vector\n0,0.0,0.0,\"[1.0, __import__]\"\n",
        )
        .expect("write table");

        let error = WorldStateStore::open(&config).expect_err("corrupt");
        assert!(matches!(error, HypertileError::CorruptRecord { line: Some(2), .. }));
        assert_eq!(error.category(), ErrorCategory::Persistence);
    }

    // Tests tables whose rows break the index sequence are corrupt as a whole file
    // Verified by trusting persisted indices
    #[test]
    fn test_table_with_gap_is_corrupt() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = config(dir.path());
        WorldStateStore::open(&config).expect("open");
        std::fs::write(
            dir.path().join(WORLD_TABLE_FILE),
            "tile_index,tile_x,tile_y,latent_vector\n1,0.0,0.0,\"[1.0, 2.0]\"\n",
        )
        .expect("write table");

        let error = WorldStateStore::open(&config).expect_err("gap");
        assert!(matches!(error, HypertileError::CorruptRecord { line: None, .. }));
        assert!(!error.to_string().contains("' line "), "{error}");
    }
}
