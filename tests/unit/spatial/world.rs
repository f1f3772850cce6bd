//! Tests for the append-only world

#[cfg(test)]
mod tests {
    use hypertile::io::error::ErrorCategory;
    use hypertile::spatial::tiles::Tile;
    use hypertile::spatial::world::World;

    fn tile(index: u64, x: f64, y: f64) -> Tile {
        Tile::new(index, [x, y], vec![x, y])
    }

    fn populated() -> World {
        World::from_tiles(
            2,
            vec![tile(0, 0.0, 0.0), tile(1, 1.0, 0.0), tile(2, 0.0, 1.0)],
        )
        .expect("valid tiles")
    }

    // Tests an empty world
    // Verified by starting the index counter at one
    #[test]
    fn test_new_world_is_empty() {
        let world = World::new(4);
        assert!(world.is_empty());
        assert_eq!(world.len(), 0);
        assert_eq!(world.next_index(), 0);
        assert_eq!(world.latent_dim(), 4);
        assert!(world.get(0).is_none());
    }

    // Tests contiguous batches append in order
    // Verified by sorting tiles on append
    #[test]
    fn test_append_contiguous() {
        let mut world = World::new(2);
        world
            .append(vec![tile(0, 0.0, 0.0), tile(1, 1.0, 0.0)])
            .expect("first batch");
        world.append(vec![tile(2, 2.0, 0.0)]).expect("second batch");

        assert_eq!(world.len(), 3);
        assert_eq!(world.next_index(), 3);
        assert_eq!(world.get(2).map(Tile::tile_x), Some(2.0));
        assert_eq!(
            world.coordinates(),
            vec![[0.0, 0.0], [1.0, 0.0], [2.0, 0.0]]
        );
        assert!(world.get(u64::MAX).is_none());
    }

    // Tests out-of-sequence indices leave the world unchanged
    // Verified by appending valid prefix tiles
    #[test]
    fn test_append_rejects_gaps() {
        let mut world = populated();
        let error = world
            .append(vec![tile(3, 0.0, 0.0), tile(5, 0.0, 0.0)])
            .expect_err("gap");
        assert_eq!(error.category(), ErrorCategory::InvalidState);
        assert_eq!(world.len(), 3);

        assert!(world.append(vec![tile(1, 0.0, 0.0)]).is_err());
    }

    // Tests dimension and finiteness validation
    // Verified by skipping the latent dimension check
    #[test]
    fn test_append_rejects_bad_tiles() {
        let mut world = populated();
        let short = world
            .append(vec![Tile::new(3, [0.0, 0.0], vec![1.0])])
            .expect_err("wrong dimension");
        assert_eq!(short.category(), ErrorCategory::Configuration);

        let nan = world
            .append(vec![Tile::new(3, [0.0, 0.0], vec![1.0, f64::NAN])])
            .expect_err("nan latent");
        assert_eq!(nan.category(), ErrorCategory::Configuration);

        assert!(
            world
                .append(vec![Tile::new(3, [f64::INFINITY, 0.0], vec![1.0, 1.0])])
                .is_err()
        );
        assert_eq!(world.len(), 3);
    }

    // Tests the full training set
    // Verified by transposing the latent matrix
    #[test]
    fn test_training_set_all_tiles() {
        let (coordinates, latents) = populated().training_set(None).expect("training set");
        assert_eq!(coordinates.len(), 3);
        assert_eq!(latents.dim(), (3, 2));
        assert!((latents[[1, 0]] - 1.0).abs() < f64::EPSILON);
        assert!((latents[[2, 1]] - 1.0).abs() < f64::EPSILON);
    }

    // Tests context hints select tiles in the given order
    // Verified by sorting context indices
    #[test]
    fn test_training_set_context() {
        let (coordinates, latents) = populated()
            .training_set(Some(&[2, 0]))
            .expect("training set");
        assert_eq!(coordinates, vec![[0.0, 1.0], [0.0, 0.0]]);
        assert_eq!(latents.dim(), (2, 2));
        assert!((latents[[0, 1]] - 1.0).abs() < f64::EPSILON);
    }

    // Tests empty worlds and bad context hints are invalid states
    // Verified by falling back to all tiles on an empty hint
    #[test]
    fn test_training_set_errors() {
        let empty = World::new(2).training_set(None).expect_err("empty world");
        assert_eq!(empty.category(), ErrorCategory::InvalidState);

        let world = populated();
        let no_context = world.training_set(Some(&[])).expect_err("empty hint");
        assert_eq!(no_context.category(), ErrorCategory::InvalidState);

        let missing = world.training_set(Some(&[0, 3])).expect_err("missing tile");
        assert_eq!(missing.category(), ErrorCategory::InvalidState);
    }
}
