//! Tests for tile image export

#[cfg(test)]
mod tests {
    use hypertile::io::error::ErrorCategory;
    use hypertile::io::image::{remove_files, save_tile_image, save_tile_images, tile_image_path};
    use image::{Rgba, RgbaImage};
    use std::path::Path;

    fn swatch(shade: u8) -> RgbaImage {
        RgbaImage::from_pixel(2, 2, Rgba([shade, shade, shade, 255]))
    }

    // Tests image file naming
    // Verified by zero-padding indices
    #[test]
    fn test_tile_image_path() {
        assert_eq!(
            tile_image_path(Path::new("images"), 7),
            Path::new("images").join("tile7.png")
        );
    }

    // Tests saving creates the directory and a readable PNG
    // Verified by writing raw pixel bytes
    #[test]
    fn test_save_tile_image() {
        let dir = tempfile::tempdir().expect("tempdir");
        let image_dir = dir.path().join("nested").join("images");
        let path = save_tile_image(&image_dir, 3, &swatch(40)).expect("save");

        assert_eq!(path, image_dir.join("tile3.png"));
        let decoded = image::open(&path).expect("decode").to_rgba8();
        assert_eq!(decoded, swatch(40));
    }

    // Tests batches are numbered consecutively
    // Verified by numbering every image from zero
    #[test]
    fn test_save_tile_images() {
        let dir = tempfile::tempdir().expect("tempdir");
        let paths = save_tile_images(dir.path(), 5, &[swatch(1), swatch(2)]).expect("save");
        assert_eq!(
            paths,
            vec![dir.path().join("tile5.png"), dir.path().join("tile6.png")]
        );
    }

    // Tests a failing image removes the ones already written
    // Verified by keeping the partial batch
    #[test]
    fn test_save_tile_images_rolls_back() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir(dir.path().join("tile1.png")).expect("block second image");

        let error = save_tile_images(dir.path(), 0, &[swatch(1), swatch(2), swatch(3)])
            .expect_err("second image fails");
        assert_eq!(error.category(), ErrorCategory::Image);
        assert!(!dir.path().join("tile0.png").exists());
        assert!(!dir.path().join("tile2.png").exists());
    }

    // Tests directory creation failures are persistence errors
    // Verified by ignoring directory creation errors
    #[test]
    fn test_unwritable_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("plain");
        std::fs::write(&file, b"not a directory").expect("write");

        let error = save_tile_image(&file, 0, &swatch(0)).expect_err("not a directory");
        assert_eq!(error.category(), ErrorCategory::Persistence);
    }

    // Tests removing missing files is not fatal
    // Verified by propagating removal errors
    #[test]
    fn test_remove_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = save_tile_image(dir.path(), 0, &swatch(9)).expect("save");
        remove_files(&[path.clone(), dir.path().join("missing.png")]);
        assert!(!path.exists());
    }
}
