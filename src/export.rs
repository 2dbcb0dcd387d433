//! Download variants of a finished design.

use std::io::Cursor;
use std::str::FromStr;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, ImageResult, RgbaImage};

use crate::constants::{JPEG_QUALITY, WEB_BOUND, WHATSAPP_BOUND};

/// Formats offered on the result page.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ExportFormat {
    /// Full resolution PNG.
    Png,
    /// Full resolution JPEG without alpha.
    Jpeg,
    /// PNG no larger than 800×800.
    Web,
    /// PNG no larger than 400×400.
    WhatsApp,
}

impl ExportFormat {
    /// All formats, in page order.
    pub const ALL: [ExportFormat; 4] = [
        ExportFormat::Png,
        ExportFormat::Jpeg,
        ExportFormat::Web,
        ExportFormat::WhatsApp,
    ];

    /// Path segment used in download URLs.
    pub fn slug(self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpeg => "jpg",
            ExportFormat::Web => "web",
            ExportFormat::WhatsApp => "whatsapp",
        }
    }

    /// Button label.
    pub fn label(self) -> &'static str {
        match self {
            ExportFormat::Png => "PNG (Best)",
            ExportFormat::Jpeg => "JPG (Print)",
            ExportFormat::Web => "Web (Small)",
            ExportFormat::WhatsApp => "WhatsApp",
        }
    }

    /// Suggested download file name.
    pub fn file_name(self) -> &'static str {
        match self {
            ExportFormat::Png => "design.png",
            ExportFormat::Jpeg => "design.jpg",
            ExportFormat::Web => "design_web.png",
            ExportFormat::WhatsApp => "design_wa.png",
        }
    }

    /// Content-Type of the encoded bytes.
    pub fn mime(self) -> &'static str {
        match self {
            ExportFormat::Jpeg => "image/jpeg",
            _ => "image/png",
        }
    }

    /// Encodes the design in this format.
    pub fn encode(self, image: &RgbaImage) -> ImageResult<Vec<u8>> {
        match self {
            ExportFormat::Png => encode_png(image),
            ExportFormat::Jpeg => encode_jpeg(image),
            ExportFormat::Web => encode_png(&downscale(image, WEB_BOUND)),
            ExportFormat::WhatsApp => encode_png(&downscale(image, WHATSAPP_BOUND)),
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        ExportFormat::ALL
            .into_iter()
            .find(|format| format.slug() == value)
            .ok_or_else(|| format!("Unknown export format: {value}"))
    }
}

fn encode_png(image: &RgbaImage) -> ImageResult<Vec<u8>> {
    let mut output = Cursor::new(Vec::new());
    image.write_to(&mut output, ImageFormat::Png)?;
    Ok(output.into_inner())
}

fn encode_jpeg(image: &RgbaImage) -> ImageResult<Vec<u8>> {
    let rgb = DynamicImage::ImageRgba8(image.clone()).into_rgb8();
    let mut output = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut output, JPEG_QUALITY);
    encoder.encode_image(&rgb)?;
    Ok(output)
}

/// Shrinks the image so its longer side fits `bound`, keeping the aspect
/// ratio. Images that already fit are returned as-is.
pub fn downscale(image: &RgbaImage, bound: u32) -> RgbaImage {
    let (width, height) = image.dimensions();
    if width <= bound && height <= bound {
        return image.clone();
    }
    let (new_width, new_height) = fit_within(width, height, bound);
    imageops::resize(image, new_width, new_height, FilterType::Lanczos3)
}

fn fit_within(width: u32, height: u32, bound: u32) -> (u32, u32) {
    if width >= height {
        let scaled = (f64::from(height) * f64::from(bound) / f64::from(width)).round() as u32;
        (bound, scaled.max(1))
    } else {
        let scaled = (f64::from(width) * f64::from(bound) / f64::from(height)).round() as u32;
        (scaled.max(1), bound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn downscale_fits_bound_and_keeps_aspect() {
        for (width, height) in [(1080, 1920), (1200, 630), (2480, 3508), (1080, 1080)] {
            let image = RgbaImage::from_pixel(width, height, Rgba([1, 2, 3, 255]));
            for bound in [WEB_BOUND, WHATSAPP_BOUND] {
                let small = downscale(&image, bound);
                let (w, h) = small.dimensions();
                assert!(w.max(h) <= bound);
                assert_eq!(w.max(h), bound);
                let expected = f64::from(width) / f64::from(height);
                let tolerance = 1.0 / f64::from(w.min(h));
                assert!(
                    (f64::from(w) / f64::from(h) - expected).abs() <= expected * tolerance,
                    "{width}x{height} -> {w}x{h}"
                );
            }
        }
    }

    #[test]
    fn downscale_never_upscales() {
        let image = RgbaImage::from_pixel(300, 200, Rgba([1, 2, 3, 255]));
        assert_eq!(downscale(&image, WEB_BOUND).dimensions(), (300, 200));
    }

    #[test]
    fn jpeg_drops_alpha() {
        let image = RgbaImage::from_pixel(16, 16, Rgba([10, 200, 30, 100]));
        let bytes = ExportFormat::Jpeg.encode(&image).expect("encode jpeg");
        let decoded = image::load_from_memory(&bytes).expect("decode jpeg");
        assert_eq!(decoded.color(), image::ColorType::Rgb8);
    }

    #[test]
    fn png_keeps_full_resolution() {
        let image = RgbaImage::from_pixel(900, 500, Rgba([10, 200, 30, 255]));
        let bytes = ExportFormat::Png.encode(&image).expect("encode png");
        let decoded = image::load_from_memory(&bytes).expect("decode png");
        assert_eq!(decoded.to_rgba8(), image);
        let web = image::load_from_memory(&ExportFormat::Web.encode(&image).expect("web"))
            .expect("decode web");
        assert_eq!((web.width(), web.height()), (800, 444));
    }

    #[test]
    fn slugs_round_trip() {
        for format in ExportFormat::ALL {
            assert_eq!(format.slug().parse::<ExportFormat>(), Ok(format));
        }
        assert!("gif".parse::<ExportFormat>().is_err());
    }
}
