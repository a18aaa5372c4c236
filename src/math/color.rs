//! RGB and HSV conversions for colour degradation
//!
//! Hue is kept in degrees, saturation and value in the unit interval. The
//! conversion round trips to within one quantisation step per channel.

/// Colour in hue/saturation/value space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsv {
    /// Hue in degrees, `[0, 360)`
    pub hue: f32,
    /// Saturation, `[0, 1]`
    pub saturation: f32,
    /// Value (brightness), `[0, 1]`
    pub value: f32,
}

/// Convert an 8-bit RGB triple to HSV
pub fn rgb_to_hsv(rgb: [u8; 3]) -> Hsv {
    let [r, g, b] = rgb.map(|c| f32::from(c) / 255.0);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let hue = if delta <= f32::EPSILON {
        0.0
    } else if (max - r).abs() <= f32::EPSILON {
        60.0 * ((g - b) / delta).rem_euclid(6.0)
    } else if (max - g).abs() <= f32::EPSILON {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };

    let saturation = if max <= f32::EPSILON { 0.0 } else { delta / max };

    Hsv {
        hue: hue.rem_euclid(360.0),
        saturation,
        value: max,
    }
}

/// Convert HSV back to an 8-bit RGB triple
pub fn hsv_to_rgb(hsv: Hsv) -> [u8; 3] {
    let saturation = hsv.saturation.clamp(0.0, 1.0);
    let value = hsv.value.clamp(0.0, 1.0);
    let chroma = value * saturation;
    let sector = hsv.hue.rem_euclid(360.0) / 60.0;
    let x = chroma * (1.0 - (sector.rem_euclid(2.0) - 1.0).abs());

    let (r, g, b) = match sector as u32 {
        0 => (chroma, x, 0.0),
        1 => (x, chroma, 0.0),
        2 => (0.0, chroma, x),
        3 => (0.0, x, chroma),
        4 => (x, 0.0, chroma),
        _ => (chroma, 0.0, x),
    };

    let m = value - chroma;
    [r, g, b].map(|c| ((c + m) * 255.0).round().clamp(0.0, 255.0) as u8)
}

/// Scale saturation and value of a colour, leaving its hue untouched
pub fn fade(rgb: [u8; 3], saturation_factor: f32, value_factor: f32) -> [u8; 3] {
    let hsv = rgb_to_hsv(rgb);
    hsv_to_rgb(Hsv {
        hue: hsv.hue,
        saturation: hsv.saturation * saturation_factor,
        value: hsv.value * value_factor,
    })
}

/// Perceptual luma (ITU-R BT.601 weights) of an RGB triple
pub fn luma(rgb: [u8; 3]) -> u8 {
    let [r, g, b] = rgb.map(f32::from);
    0.114f32
        .mul_add(b, 0.299f32.mul_add(r, 0.587 * g))
        .round()
        .clamp(0.0, 255.0) as u8
}
