//! Tests for RGB/HSV conversion and colour fading

#[cfg(test)]
mod tests {
    use shardset::math::color::{Hsv, fade, hsv_to_rgb, luma, rgb_to_hsv};

    // Tests primary colours map to their canonical hues
    // Verified by swapping the green and blue sector offsets
    #[test]
    fn test_rgb_to_hsv_primary_hues() {
        let red = rgb_to_hsv([255, 0, 0]);
        let green = rgb_to_hsv([0, 255, 0]);
        let blue = rgb_to_hsv([0, 0, 255]);

        assert!(red.hue.abs() < 1e-4);
        assert!((green.hue - 120.0).abs() < 1e-4);
        assert!((blue.hue - 240.0).abs() < 1e-4);
        assert!((red.saturation - 1.0).abs() < f32::EPSILON);
        assert!((blue.value - 1.0).abs() < f32::EPSILON);
    }

    // Tests grays have zero saturation and keep their brightness
    // Verified by dividing by delta without the zero check
    #[test]
    fn test_rgb_to_hsv_gray_is_unsaturated() {
        let gray = rgb_to_hsv([128, 128, 128]);

        assert!(gray.saturation.abs() < f32::EPSILON);
        assert!((gray.value - 128.0 / 255.0).abs() < 1e-6);
        assert_eq!(rgb_to_hsv([0, 0, 0]).saturation, 0.0);
    }

    // Tests RGB -> HSV -> RGB reproduces every sampled colour exactly
    // Verified by truncating instead of rounding in hsv_to_rgb
    #[test]
    fn test_hsv_round_trip() {
        for r in (0..=255u8).step_by(17) {
            for g in (0..=255u8).step_by(51) {
                for b in (0..=255u8).step_by(85) {
                    let rgb = [r, g, b];
                    assert_eq!(hsv_to_rgb(rgb_to_hsv(rgb)), rgb, "round trip of {rgb:?}");
                }
            }
        }
    }

    // Tests out-of-range saturation and value are clamped
    // Verified by removing the clamps in hsv_to_rgb
    #[test]
    fn test_hsv_to_rgb_clamps_components() {
        let rgb = hsv_to_rgb(Hsv {
            hue: 0.0,
            saturation: 2.0,
            value: 1.5,
        });

        assert_eq!(rgb, [255, 0, 0]);
    }

    // Tests fading keeps the hue of saturated colours
    // Verified by scaling hue together with saturation
    #[test]
    fn test_fade_preserves_hue() {
        for rgb in [[200, 40, 40], [30, 180, 90], [60, 70, 220], [240, 200, 10]] {
            let before = rgb_to_hsv(rgb);
            let after = rgb_to_hsv(fade(rgb, 0.6, 0.85));

            let difference = (before.hue - after.hue).abs();
            let wrapped = difference.min(360.0 - difference);
            assert!(wrapped < 3.0, "hue drifted by {wrapped} for {rgb:?}");
            assert!(after.saturation <= before.saturation + 1e-3);
            assert!(after.value <= before.value + 1e-3);
        }
    }

    // Tests unit factors leave a colour unchanged
    // Verified by applying a fixed fade regardless of the factors
    #[test]
    fn test_fade_identity_factors() {
        assert_eq!(fade([12, 200, 77], 1.0, 1.0), [12, 200, 77]);
    }

    // Tests luma weights and extremes
    // Verified by using equal channel weights
    #[test]
    fn test_luma() {
        assert_eq!(luma([0, 0, 0]), 0);
        assert_eq!(luma([255, 255, 255]), 255);
        assert_eq!(luma([255, 0, 0]), 76);
        assert_eq!(luma([0, 255, 0]), 150);
        assert_eq!(luma([0, 0, 255]), 29);
    }
}
