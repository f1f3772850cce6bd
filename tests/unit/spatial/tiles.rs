//! Tests for tile records and coordinate parsing

#[cfg(test)]
mod tests {
    use hypertile::spatial::tiles::{Tile, is_finite_coordinate, parse_coordinate};

    // Tests accessors return constructor values
    // Verified by swapping x and y in the constructor
    #[test]
    fn test_tile_accessors() {
        let tile = Tile::new(7, [1.5, -2.0], vec![0.1, 0.2, 0.3]);
        assert_eq!(tile.tile_index(), 7);
        assert!((tile.tile_x() - 1.5).abs() < f64::EPSILON);
        assert!((tile.tile_y() + 2.0).abs() < f64::EPSILON);
        assert_eq!(tile.coordinate(), [1.5, -2.0]);
        assert_eq!(tile.latent_vector(), &[0.1, 0.2, 0.3]);
        assert_eq!(tile.latent_dim(), 3);
    }

    // Tests finiteness check on both components
    // Verified by checking only the first component
    #[test]
    fn test_is_finite_coordinate() {
        assert!(is_finite_coordinate([0.0, -1e300]));
        assert!(!is_finite_coordinate([f64::NAN, 0.0]));
        assert!(!is_finite_coordinate([0.0, f64::NEG_INFINITY]));
    }

    // Tests coordinate parsing accepts signed and spaced pairs
    // Verified by not trimming whitespace
    #[test]
    fn test_parse_coordinate_valid() {
        assert_eq!(parse_coordinate("0,0"), Ok([0.0, 0.0]));
        assert_eq!(parse_coordinate("-1.5, 2"), Ok([-1.5, 2.0]));
        assert_eq!(parse_coordinate(" 1e-3 ,-4 "), Ok([1e-3, -4.0]));
    }

    // Tests malformed and non-finite coordinates are rejected
    // Verified by ignoring a third component
    #[test]
    fn test_parse_coordinate_invalid() {
        for text in ["", "1", "1,2,3", "a,1", "1,", "inf,0", "0,NaN"] {
            assert!(parse_coordinate(text).is_err(), "accepted '{text}'");
        }
    }
}
