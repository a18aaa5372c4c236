//! Tests for image loading, PNG export and extension matching

#[cfg(test)]
mod tests {
    use image::{Rgba, RgbaImage};
    use shardset::io::error::ErrorKind;
    use shardset::io::image::{has_extension, load_rgba, save_png};
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    // Tests a saved PNG loads back with identical RGBA pixels
    // Verified by saving without the alpha channel
    #[test]
    fn test_save_and_load_png() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested/dir/piece.png");
        let image = RgbaImage::from_fn(5, 4, |x, y| Rgba([x as u8, y as u8, 7, (x * 50) as u8]));

        save_png(&image, &path).unwrap();
        let loaded = load_rgba(&path).unwrap();

        assert_eq!(loaded, image);
    }

    // Tests undecodable files are input errors
    // Verified by mapping decode failures to file system errors
    #[test]
    fn test_load_rejects_garbage() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.png");
        fs::write(&path, "not a png").unwrap();

        let error = load_rgba(&path).err().unwrap();
        assert_eq!(error.kind(), ErrorKind::Input);
        assert!(error.to_string().contains("broken.png"));
    }

    // Tests extension matching ignores case
    // Verified by comparing extensions case-sensitively
    #[test]
    fn test_has_extension() {
        let extensions = ["png", "jpg", "jpeg"];

        assert!(has_extension(Path::new("a/b.PNG"), &extensions));
        assert!(has_extension(Path::new("photo.JpEg"), &extensions));
        assert!(!has_extension(Path::new("notes.txt"), &extensions));
        assert!(!has_extension(Path::new("png"), &extensions));
    }
}
