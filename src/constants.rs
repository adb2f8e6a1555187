use std::time::Duration;

/// Quality used for every lossy re-encode (JPEG and WebP).
pub const LOSSY_QUALITY: u8 = 70;

pub const OXIPNG_PRESET: u8 = 6;
pub const LIBDEFLATER_MAX_LEVEL: u8 = 12;

pub const MAX_IMAGE_DIMENSION: u32 = 16_384;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;

pub const COMPRESS_ROUTE: &str = "/api/compress";
pub const IMAGE_FIELD: &str = "image";
pub const FORMAT_FIELD: &str = "format";

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:3000";
pub const ENV_PREFIX: &str = "IMG_SQUEEZE";

pub const NO_IMAGE_MESSAGE: &str = "No image uploaded";
pub const COMPRESSION_FAILED_MESSAGE: &str = "Compression failed";

// Simulated upload progress
pub const PROGRESS_INITIAL: u8 = 10;
pub const PROGRESS_STEP: u8 = 10;
pub const PROGRESS_CAP: u8 = 90;
pub const PROGRESS_TICK: Duration = Duration::from_millis(200);

pub const DOWNLOAD_PREFIX: &str = "compressed-";
pub const IMAGE_CONTENT_TYPE_PREFIX: &str = "image/";
pub const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

pub const PROGRESS_BAR_TEMPLATE: &str = "{prefix:>24} [{bar:40.cyan/blue}] {pos:>3}% {msg}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqueezeImageFormat {
    Jpeg,
    Png,
    WebP,
    Bmp,
    Tiff,
    Gif,
    Avif,
}

impl SqueezeImageFormat {
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_lowercase().as_str() {
            "jpg" | "jpeg" => Some(SqueezeImageFormat::Jpeg),
            "png" => Some(SqueezeImageFormat::Png),
            "webp" => Some(SqueezeImageFormat::WebP),
            "bmp" => Some(SqueezeImageFormat::Bmp),
            "tif" | "tiff" => Some(SqueezeImageFormat::Tiff),
            "gif" => Some(SqueezeImageFormat::Gif),
            "avif" => Some(SqueezeImageFormat::Avif),
            _ => None,
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            SqueezeImageFormat::Jpeg => "image/jpeg",
            SqueezeImageFormat::Png => "image/png",
            SqueezeImageFormat::WebP => "image/webp",
            SqueezeImageFormat::Bmp => "image/bmp",
            SqueezeImageFormat::Tiff => "image/tiff",
            SqueezeImageFormat::Gif => "image/gif",
            SqueezeImageFormat::Avif => "image/avif",
        }
    }
}

/// Maps a file extension to the content type a browser would declare for it.
pub fn content_type_for_extension(extension: &str) -> &'static str {
    if let Some(format) = SqueezeImageFormat::from_extension(extension) {
        return format.mime_type();
    }
    match extension.to_lowercase().as_str() {
        "txt" | "md" | "log" => "text/plain",
        "json" => "application/json",
        "pdf" => "application/pdf",
        _ => FALLBACK_CONTENT_TYPE,
    }
}
