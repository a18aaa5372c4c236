//! Tests for edge erosion, softening and colour fading

#[cfg(test)]
mod tests {
    use image::{Rgba, RgbaImage};
    use ndarray::Array2;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use shardset::fragment::Fragment;
    use shardset::fragment::erosion::{
        BatchStatistics, ErosionParameters, StructuringElement, alpha_mask, box_blur, chip_size,
        erode_fragment, erode_fragments,
    };
    use shardset::geometry::{Point, SiteId};
    use shardset::math::color::rgb_to_hsv;

    fn disc_fragment(radius: u32, color: [u8; 3]) -> Fragment {
        let size = radius * 2 + 1;
        let pixels = RgbaImage::from_fn(size, size, |x, y| {
            let dx = f64::from(x) - f64::from(radius);
            let dy = f64::from(y) - f64::from(radius);
            if dx.hypot(dy) <= f64::from(radius) {
                Rgba([color[0], color[1], color[2], 255])
            } else {
                Rgba([0, 0, 0, 0])
            }
        });
        Fragment {
            cells: vec![SiteId(0)],
            anchor: Point::new(f64::from(radius), f64::from(radius)),
            offset: Point::new(0, 0),
            pixels,
            rotation: 0.0,
        }
    }

    fn parameters(probability: f64, percentage: f64) -> ErosionParameters {
        ErosionParameters {
            min_distance: 4,
            probability,
            percentage,
        }
    }

    // Tests erosion never increases the number of visible pixels
    // Verified by taking the max of the mask and the blurred mask
    #[test]
    fn test_erosion_is_monotone() {
        let fragments: Vec<Fragment> = (4..12)
            .map(|r| disc_fragment(r, [180, 60, 40]))
            .collect();
        let before: Vec<usize> = fragments.iter().map(Fragment::opaque_pixel_count).collect();

        let eroded = erode_fragments(
            fragments,
            &parameters(1.0, 40.0),
            &mut StdRng::seed_from_u64(3),
        )
        .unwrap_or_else(|e| panic!("erosion failed: {e}"));

        assert_eq!(eroded.len(), before.len());
        for (fragment, count) in eroded.iter().zip(&before) {
            assert!(fragment.opaque_pixel_count() <= *count);
        }
    }

    // Tests chipping removes edge pixels when erosion is certain
    // Verified by skipping the structuring element erosion
    #[test]
    fn test_certain_erosion_chips_edges() {
        let fragment = disc_fragment(20, [90, 90, 200]);
        let before = fragment.opaque_pixel_count();
        let statistics = BatchStatistics::measure(std::slice::from_ref(&fragment));

        let eroded = erode_fragment(
            fragment,
            &parameters(1.0, 50.0),
            &statistics,
            &mut StdRng::seed_from_u64(8),
        );

        assert!(eroded.opaque_pixel_count() < before);
    }

    // Tests fully transparent pixels carry no colour
    // Verified by keeping the faded colour under zero alpha
    #[test]
    fn test_transparent_pixels_are_cleared() {
        let fragment = disc_fragment(10, [250, 250, 10]);
        let statistics = BatchStatistics::measure(std::slice::from_ref(&fragment));
        let eroded = erode_fragment(
            fragment,
            &parameters(1.0, 60.0),
            &statistics,
            &mut StdRng::seed_from_u64(21),
        );

        for pixel in eroded.pixels.pixels() {
            if pixel.0[3] == 0 {
                assert_eq!(pixel.0, [0, 0, 0, 0]);
            }
        }
    }

    // Tests fading keeps hue and never brightens or saturates
    // Verified by drawing the value factor from [0.8, 1.2]
    #[test]
    fn test_fading_keeps_hue() {
        let color = [40, 160, 220];
        let fragment = disc_fragment(12, color);
        let statistics = BatchStatistics::measure(std::slice::from_ref(&fragment));
        let eroded = erode_fragment(
            fragment,
            &parameters(0.0, 0.0),
            &statistics,
            &mut StdRng::seed_from_u64(5),
        );
        let original = rgb_to_hsv(color);

        let centre = eroded
            .pixels
            .get_pixel_checked(12, 12)
            .unwrap_or_else(|| panic!("centre pixel missing"));
        let faded = rgb_to_hsv([centre.0[0], centre.0[1], centre.0[2]]);
        assert!((faded.hue - original.hue).abs() < 2.0);
        assert!(faded.saturation <= original.saturation + 1e-3);
        assert!(faded.value <= original.value + 1e-3);
        assert!(faded.saturation >= original.saturation * 0.5 - 0.01);
        assert!(faded.value >= original.value * 0.8 - 0.01);
    }

    // Tests batch erosion is reproducible under parallel scheduling
    // Verified by sharing one locked stream across the worker threads
    #[test]
    fn test_batch_erosion_is_reproducible() {
        let make = || -> Vec<Fragment> {
            (5..9)
                .map(|r| disc_fragment(r, [100, 120, 140]))
                .collect()
        };
        let settings = parameters(0.6, 30.0);

        let first = erode_fragments(make(), &settings, &mut StdRng::seed_from_u64(13));
        let second = erode_fragments(make(), &settings, &mut StdRng::seed_from_u64(13));

        match (first, second) {
            (Ok(a), Ok(b)) => {
                for (x, y) in a.iter().zip(&b) {
                    assert_eq!(x.pixels.as_raw(), y.pixels.as_raw());
                }
            }
            _ => panic!("erosion failed"),
        }
    }

    // Tests out-of-range parameters are rejected
    // Verified by removing the probability range check
    #[test]
    fn test_parameters_validated() {
        assert!(parameters(1.5, 10.0).validate().is_err());
        assert!(parameters(0.5, 120.0).validate().is_err());
        assert!(parameters(0.5, 30.0).validate().is_ok());

        let result = erode_fragments(
            vec![disc_fragment(3, [1, 2, 3])],
            &parameters(-0.1, 10.0),
            &mut StdRng::seed_from_u64(0),
        );
        assert!(result.is_err());
    }

    // Tests the chip size follows the square root of the opaque area and is capped
    // Verified by sizing from the opaque count directly
    #[test]
    fn test_chip_size() {
        assert_eq!(chip_size(400, 30.0), 6);
        assert_eq!(chip_size(100, 0.0), 0);
        assert_eq!(chip_size(1_000_000, 100.0), 25);
    }

    // Tests the blur range runs from half the minimum distance to half the largest side
    // Verified by using the smallest fragment side as the upper bound
    #[test]
    fn test_blur_range() {
        let statistics = BatchStatistics {
            largest_dimension: 40,
        };

        assert_eq!(statistics.blur_range(6), (3, 20));
        assert_eq!(statistics.blur_range(0), (1, 20));
        assert_eq!(statistics.blur_range(100), (50, 50));
        let measured = BatchStatistics::measure(&[disc_fragment(7, [0, 0, 0])]);
        assert_eq!(measured.largest_dimension, 15);
    }

    // Tests an unrotated element is a full square and rotation drops corners
    // Verified by ignoring the angle
    #[test]
    fn test_structuring_element_shapes() {
        let square = StructuringElement::rotated_square(5, 0.0);
        assert_eq!(square.size(), 5);
        assert_eq!(square.count(), 25);

        let diamond = StructuringElement::rotated_square(5, 45.0);
        assert!(diamond.count() < 25);
        assert!(diamond.contains(2, 2));
        assert!(!diamond.contains(0, 0));
        assert!(!diamond.contains(5, 0));
    }

    // Tests grayscale erosion shrinks a block by the element radius
    // Verified by taking the maximum under the element
    #[test]
    fn test_element_erode_shrinks_block() {
        let mut mask = Array2::<u8>::zeros((9, 9));
        for row in 2..7 {
            for col in 2..7 {
                if let Some(cell) = mask.get_mut((row, col)) {
                    *cell = 255;
                }
            }
        }
        let eroded = StructuringElement::rotated_square(3, 0.0).erode(&mask);

        let remaining = eroded.iter().filter(|&&v| v != 0).count();
        assert_eq!(remaining, 9);
        assert_eq!(eroded.get((4, 4)), Some(&255));
        assert_eq!(eroded.get((2, 2)), Some(&0));
    }

    // Tests the box blur averages over clipped windows
    // Verified by dividing by the full window area at the border
    #[test]
    fn test_box_blur() {
        let flat = Array2::<u8>::from_elem((6, 6), 200);
        assert_eq!(box_blur(&flat, 5), flat);

        let mut spike = Array2::<u8>::zeros((3, 3));
        if let Some(cell) = spike.get_mut((1, 1)) {
            *cell = 90;
        }
        let blurred = box_blur(&spike, 3);
        assert_eq!(blurred.get((1, 1)), Some(&10));
        assert_eq!(blurred.get((0, 0)), Some(&23));
        assert_eq!(box_blur(&spike, 1), spike);
    }

    // Tests the alpha mask mirrors the alpha channel in row-major layout
    // Verified by transposing the mask
    #[test]
    fn test_alpha_mask_layout() {
        let image = RgbaImage::from_fn(3, 2, |x, y| Rgba([0, 0, 0, (x + 10 * y) as u8]));
        let mask = alpha_mask(&image);

        assert_eq!(mask.dim(), (2, 3));
        assert_eq!(mask.get((1, 2)), Some(&12));
    }
}
