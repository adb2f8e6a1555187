use crate::constants::{LIBDEFLATER_MAX_LEVEL, LOSSY_QUALITY, MAX_IMAGE_DIMENSION, OXIPNG_PRESET};
use crate::error::{CompressionError, Result};
use crate::formats::TargetFormat;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ColorType, DynamicImage, GenericImageView};
use oxipng::{Deflaters, Options};

/// How hard the encoder should squeeze.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeLevel {
    /// Lossy quality, 1-100
    Quality(u8),
    /// Lossless with the strongest deflate settings available
    MaxCompression,
}

/// What to produce from an uploaded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeSpec {
    pub format: TargetFormat,
    pub level: EncodeLevel,
}

impl EncodeSpec {
    /// The fixed encode settings the endpoint uses for each format.
    pub fn for_format(format: TargetFormat) -> Self {
        let level = match format {
            TargetFormat::Png => EncodeLevel::MaxCompression,
            TargetFormat::Jpeg | TargetFormat::WebP => EncodeLevel::Quality(LOSSY_QUALITY),
        };
        Self { format, level }
    }

    fn quality(&self) -> u8 {
        match self.level {
            EncodeLevel::Quality(q) => q.clamp(1, 100),
            EncodeLevel::MaxCompression => 100,
        }
    }
}

/// Re-encodes raw uploaded bytes into the requested format.
///
/// Implementations must be stateless across calls: the endpoint shares one
/// encoder between all in-flight requests.
pub trait ImageEncoder: Send + Sync {
    fn encode(&self, bytes: &[u8], spec: &EncodeSpec) -> Result<Vec<u8>>;
}

/// Encoder backed by the `image`, `oxipng` and `webp` crates.
#[derive(Debug, Clone, Copy, Default)]
pub struct RasterEncoder;

impl ImageEncoder for RasterEncoder {
    fn encode(&self, bytes: &[u8], spec: &EncodeSpec) -> Result<Vec<u8>> {
        let img = decode_image(bytes)?;
        match spec.format {
            TargetFormat::Jpeg => encode_jpeg(&img, spec.quality()),
            TargetFormat::Png => encode_png(&img),
            TargetFormat::WebP => encode_webp(&img, spec.quality()),
        }
    }
}

/// Decodes an in-memory image, guessing its format from the content.
///
/// # Security
/// - Rejects images whose decoded dimensions exceed `MAX_IMAGE_DIMENSION`
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage> {
    let img = image::load_from_memory(bytes)?;

    let (width, height) = img.dimensions();
    if width > MAX_IMAGE_DIMENSION || height > MAX_IMAGE_DIMENSION {
        return Err(CompressionError::InvalidDimensions(
            width,
            height,
            MAX_IMAGE_DIMENSION,
        ));
    }

    Ok(img)
}

fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
    // JPEG has no alpha channel
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());

    let mut out = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut out, quality);
    rgb.write_with_encoder(encoder)?;
    Ok(out)
}

fn encode_png(img: &DynamicImage) -> Result<Vec<u8>> {
    let converted;
    let img = match img.color() {
        ColorType::Rgb32F | ColorType::Rgba32F => {
            converted = DynamicImage::ImageRgba16(img.to_rgba16());
            &converted
        }
        _ => img,
    };

    let mut raw = Vec::new();
    let encoder = PngEncoder::new_with_quality(&mut raw, CompressionType::Best, FilterType::Adaptive);
    img.write_with_encoder(encoder)?;

    let mut options = Options::from_preset(OXIPNG_PRESET);
    options.deflate = Deflaters::Libdeflater {
        compression: LIBDEFLATER_MAX_LEVEL,
    };

    let optimized = oxipng::optimize_from_memory(&raw, &options)
        .map_err(|e| CompressionError::PngOptimization(e.to_string()))?;

    if optimized.len() < raw.len() {
        Ok(optimized)
    } else {
        Ok(raw)
    }
}

fn encode_webp(img: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
    // libwebp only takes 8-bit RGB or RGBA
    let img = if img.color().has_alpha() {
        DynamicImage::ImageRgba8(img.to_rgba8())
    } else {
        DynamicImage::ImageRgb8(img.to_rgb8())
    };

    let encoder = webp::Encoder::from_image(&img)
        .map_err(|e| CompressionError::WebPEncoding(e.to_string()))?;
    Ok(encoder.encode(f32::from(quality)).to_vec())
}
