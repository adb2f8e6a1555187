//! Target format handling for the compression endpoint and upload client
//!
//! The endpoint is lenient: any unknown or missing format value falls back to
//! JPEG. The CLI is strict and parses through clap's `ValueEnum`.

use std::fmt;

/// Output encodings the endpoint can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum TargetFormat {
    /// Lossy JPEG at the fixed quality
    #[default]
    #[value(name = "jpeg", alias = "jpg")]
    Jpeg,
    /// Lossless PNG at maximum compression effort
    #[value(name = "png")]
    Png,
    /// Lossy WebP at the fixed quality
    #[value(name = "webp")]
    WebP,
}

impl TargetFormat {
    /// Resolves a multipart `format` field. The value is only lower-cased;
    /// missing or unrecognized values (including padded ones) become JPEG.
    pub fn from_form_value(value: Option<&str>) -> Self {
        value
            .map(str::to_lowercase)
            .and_then(|v| match v.as_str() {
                "jpeg" => Some(TargetFormat::Jpeg),
                "png" => Some(TargetFormat::Png),
                "webp" => Some(TargetFormat::WebP),
                _ => None,
            })
            .unwrap_or_default()
    }

    /// The value sent in the multipart `format` field
    pub fn form_value(&self) -> &'static str {
        match self {
            TargetFormat::Jpeg => "jpeg",
            TargetFormat::Png => "png",
            TargetFormat::WebP => "webp",
        }
    }

    /// `image/<format>`, as returned by the endpoint
    pub fn mime_type(&self) -> &'static str {
        match self {
            TargetFormat::Jpeg => "image/jpeg",
            TargetFormat::Png => "image/png",
            TargetFormat::WebP => "image/webp",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            TargetFormat::Jpeg => "jpg",
            TargetFormat::Png => "png",
            TargetFormat::WebP => "webp",
        }
    }

    pub fn all_formats() -> [TargetFormat; 3] {
        [TargetFormat::Jpeg, TargetFormat::Png, TargetFormat::WebP]
    }
}

impl fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TargetFormat::Jpeg => "JPEG",
            TargetFormat::Png => "PNG",
            TargetFormat::WebP => "WebP",
        };
        write!(f, "{}", name)
    }
}
