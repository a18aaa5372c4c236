//! Tests for dataset folder layout, writing and integrity checks

#[cfg(test)]
mod tests {
    use image::{Rgba, RgbaImage};
    use shardset::FragmentationError;
    use shardset::fragment::Fragment;
    use shardset::geometry::{Point, SiteId};
    use shardset::io::configuration::FragmentationConfig;
    use shardset::io::error::ErrorKind;
    use shardset::io::ledger::read_ledger;
    use shardset::io::output::{
        RunLayout, check_integrity, fragment_image_ids, run_timestamp, verify_dataset,
        write_dataset,
    };
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn fragments(count: usize) -> Vec<Fragment> {
        (0..count)
            .map(|index| Fragment {
                cells: vec![SiteId(index)],
                anchor: Point::new(index as f64 + 0.5, 2.0),
                offset: Point::new(index as i64, -1),
                pixels: RgbaImage::from_pixel(2, 3, Rgba([index as u8, 9, 9, 255])),
                rotation: index as f64 * 10.0,
            })
            .collect()
    }

    fn written_dataset(temp_dir: &TempDir, count: usize) -> RunLayout {
        let layout = RunLayout::at(&temp_dir.path().join("run"));
        layout.create().unwrap();
        write_dataset(&layout, &fragments(count), &FragmentationConfig::default()).unwrap();
        layout
    }

    // Tests the folder layout and file names
    // Verified by swapping the ledger and parameter file names
    #[test]
    fn test_layout_paths() {
        let layout = RunLayout::for_image(
            Path::new("out"),
            Path::new("images/vase.jpg"),
            "2024-01-02_03-04-05",
        );

        assert_eq!(layout.root, Path::new("out/vase-2024-01-02_03-04-05"));
        assert_eq!(layout.resources, layout.root.join("resources"));
        assert_eq!(layout.fragments, layout.root.join("fragments"));
        assert_eq!(
            layout.parameters_path(),
            layout.root.join("resources/fragmentation_info.txt")
        );
        assert_eq!(
            layout.ledger_path(),
            layout.root.join("resources/fragment_info.txt")
        );
        assert_eq!(
            layout.fragment_path("fragment_0003"),
            layout.root.join("fragments/fragment_0003.png")
        );
        assert_eq!(
            layout.reconstruction_path(),
            layout.root.join("ricostructed_image.png")
        );
    }

    // Tests timestamps use the run folder format
    // Verified by including a colon in the format
    #[test]
    fn test_run_timestamp_format() {
        let stamp = run_timestamp();

        assert_eq!(stamp.len(), "2024-01-02_03-04-05".len());
        assert!(!stamp.contains(':'));
        assert!(chrono::NaiveDateTime::parse_from_str(&stamp, "%Y-%m-%d_%H-%M-%S").is_ok());
    }

    // Tests an existing run folder is never reused
    // Verified by using create_dir_all for the root
    #[test]
    fn test_create_refuses_existing_folder() {
        let temp_dir = TempDir::new().unwrap();
        let layout = RunLayout::at(&temp_dir.path().join("nested/run"));

        layout.create().unwrap();
        assert!(layout.resources.is_dir());
        assert!(layout.fragments.is_dir());

        let error = layout.create().err().unwrap();
        assert!(matches!(error, FragmentationError::RunFolderExists { .. }));
        assert_eq!(error.kind(), ErrorKind::Io);
    }

    // Tests images sharing a stem in the same second get distinct numbered folders
    // Verified by returning the collision instead of trying the next suffix
    #[test]
    fn test_create_for_image_numbers_taken_names() {
        let temp_dir = TempDir::new().unwrap();
        let stamp = "2024-01-02_03-04-05";

        let png = RunLayout::create_for_image(temp_dir.path(), Path::new("in/vase.png"), stamp)
            .unwrap();
        let jpg = RunLayout::create_for_image(temp_dir.path(), Path::new("in/vase.jpg"), stamp)
            .unwrap();
        let third = RunLayout::create_for_image(temp_dir.path(), Path::new("vase.jpeg"), stamp)
            .unwrap();

        assert_eq!(png.root, temp_dir.path().join("vase-2024-01-02_03-04-05"));
        assert_eq!(jpg.root, temp_dir.path().join("vase-2024-01-02_03-04-05-2"));
        assert_eq!(third.root, temp_dir.path().join("vase-2024-01-02_03-04-05-3"));
        for layout in [&png, &jpg, &third] {
            assert!(layout.resources.is_dir());
            assert!(layout.fragments.is_dir());
        }
    }

    // Tests every fragment gets an image and a matching ledger record
    // Verified by numbering records from one
    #[test]
    fn test_write_dataset() {
        let temp_dir = TempDir::new().unwrap();
        let layout = written_dataset(&temp_dir, 3);

        let records = read_ledger(&layout.ledger_path()).unwrap();
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["fragment_0000", "fragment_0001", "fragment_0002"]);

        let second = records.get(1).unwrap();
        assert_eq!(second.offset, Point::new(1, -1));
        assert!((second.anchor.x - 1.5).abs() < f64::EPSILON);
        assert!((second.angle - 10.0).abs() < f64::EPSILON);

        for record in &records {
            assert!(layout.fragment_path(&record.id).is_file());
        }
        assert_eq!(
            FragmentationConfig::from_file(&layout.parameters_path()).unwrap(),
            FragmentationConfig::default()
        );
    }

    // Tests an untouched dataset verifies cleanly
    // Verified by counting unrecorded images as paired
    #[test]
    fn test_verify_consistent_dataset() {
        let temp_dir = TempDir::new().unwrap();
        let layout = written_dataset(&temp_dir, 4);

        let report = verify_dataset(&layout).unwrap();
        assert_eq!(report.paired, 4);
        assert!(report.is_consistent());
        assert_eq!(fragment_image_ids(&layout.fragments).unwrap().len(), 4);
    }

    // Tests deleted and stray images are both reported
    // Verified by only checking records against images
    #[test]
    fn test_verify_detects_mismatch() {
        let temp_dir = TempDir::new().unwrap();
        let layout = written_dataset(&temp_dir, 4);
        fs::remove_file(layout.fragment_path("fragment_0002")).unwrap();
        fs::copy(
            layout.fragment_path("fragment_0000"),
            layout.fragment_path("fragment_0099"),
        )
        .unwrap();

        let report = check_integrity(&layout).unwrap();
        assert_eq!(report.paired, 3);
        assert_eq!(report.missing_images, vec!["fragment_0002".to_string()]);
        assert_eq!(report.unrecorded_images, vec!["fragment_0099".to_string()]);

        let error = verify_dataset(&layout).err().unwrap();
        assert_eq!(error.kind(), ErrorKind::DataIntegrity);
        assert!(error.to_string().contains("fragment_0002"));
    }

    // Tests a dataset without a ledger cannot be verified
    // Verified by treating a missing ledger as empty
    #[test]
    fn test_verify_without_ledger() {
        let temp_dir = TempDir::new().unwrap();
        let layout = RunLayout::at(temp_dir.path());
        fs::create_dir(&layout.fragments).unwrap();

        assert_eq!(
            verify_dataset(&layout).err().map(|e| e.kind()),
            Some(ErrorKind::Io)
        );
    }
}
