//! Brightness, contrast and saturation adjustments.
//!
//! Each operation blends between a degenerate image and the input by a
//! factor: `0.0` gives the degenerate image, `1.0` the input, and values
//! above one push past it. Alpha is never changed.

use image::{Rgba, RgbaImage};

/// Scales every channel towards black.
pub fn adjust_brightness(image: &RgbaImage, factor: f32) -> RgbaImage {
    map_rgb(image, |channel, _| channel * factor)
}

/// Scales the distance of every channel from the image's mean grey.
pub fn adjust_contrast(image: &RgbaImage, factor: f32) -> RgbaImage {
    let mean = mean_luma(image);
    map_rgb(image, |channel, _| mean + (channel - mean) * factor)
}

/// Scales the distance of every channel from the pixel's own grey.
pub fn adjust_saturation(image: &RgbaImage, factor: f32) -> RgbaImage {
    map_rgb(image, |channel, grey| grey + (channel - grey) * factor)
}

/// Multipliers picked in the form.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Adjustments {
    /// Brightness multiplier.
    pub brightness: f32,
    /// Contrast multiplier.
    pub contrast: f32,
    /// Saturation multiplier.
    pub saturation: f32,
}

impl Default for Adjustments {
    fn default() -> Self {
        Self {
            brightness: 1.0,
            contrast: 1.0,
            saturation: 1.0,
        }
    }
}

impl Adjustments {
    /// Applies brightness, then contrast, then saturation, skipping any
    /// factor of exactly one.
    pub fn apply(&self, image: &RgbaImage) -> RgbaImage {
        let mut adjusted = image.clone();
        if !is_identity(self.brightness) {
            adjusted = adjust_brightness(&adjusted, self.brightness);
        }
        if !is_identity(self.contrast) {
            adjusted = adjust_contrast(&adjusted, self.contrast);
        }
        if !is_identity(self.saturation) {
            adjusted = adjust_saturation(&adjusted, self.saturation);
        }
        adjusted
    }
}

fn is_identity(factor: f32) -> bool {
    (factor - 1.0).abs() < f32::EPSILON
}

fn luma(pixel: &Rgba<u8>) -> f32 {
    let [r, g, b, _] = pixel.0;
    (299.0 * f32::from(r) + 587.0 * f32::from(g) + 114.0 * f32::from(b)) / 1000.0
}

fn mean_luma(image: &RgbaImage) -> f32 {
    let count = u64::from(image.width()) * u64::from(image.height());
    if count == 0 {
        return 0.0;
    }
    let total: f64 = image.pixels().map(|pixel| f64::from(luma(pixel).floor())).sum();
    (total / count as f64).round() as f32
}

/// Rebuilds the image, passing each colour channel and the pixel's grey
/// level through `op`.
fn map_rgb(image: &RgbaImage, op: impl Fn(f32, f32) -> f32) -> RgbaImage {
    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        let grey = luma(pixel).floor();
        for channel in 0..3 {
            let value = op(f32::from(pixel.0[channel]), grey);
            pixel.0[channel] = value.round().clamp(0.0, 255.0) as u8;
        }
    }
    out
}
