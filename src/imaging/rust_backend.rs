//! Pure Rust codec backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP) | `image::ImageReader` with guessed format |
//! | EXIF orientation | `kamadak-exif` via [`read_orientation`] (JPEG only) |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` at the configured quality |
//! | Encode → AVIF | `image::codecs::avif::AvifEncoder` (rav1e, speed 6) |
//! | Encode → PNG, WebP, TIFF | `DynamicImage::save_with_format` |

use super::backend::{BackendError, ImageBackend, Source, SourceImage};
use super::orientation::{Orientation, read_orientation};
use super::params::{OutputFormat, Quality};
use image::{DynamicImage, ImageFormat, ImageReader};
use std::io::{BufWriter, Cursor};
use std::path::Path;
use tracing::debug;

/// Backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
#[derive(Debug, Clone, Copy, Default)]
pub struct RustBackend {
    quality: Quality,
}

impl RustBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend encoding lossy formats at `quality`.
    pub fn with_quality(quality: Quality) -> Self {
        Self { quality }
    }

    pub fn quality(&self) -> Quality {
        self.quality
    }
}

/// Decode encoded bytes, sniffing the format from the content.
fn decode_bytes(bytes: &[u8]) -> Result<SourceImage, BackendError> {
    let reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
    let format = reader
        .format()
        .ok_or_else(|| BackendError::Decode("unrecognized image format".into()))?;
    let image = reader
        .decode()
        .map_err(|e| BackendError::Decode(e.to_string()))?;

    let orientation = if format == ImageFormat::Jpeg {
        read_orientation(bytes)
    } else {
        Orientation::Normal
    };
    debug!(?format, ?orientation, width = image.width(), height = image.height(), "decoded");

    Ok(SourceImage {
        image,
        format: Some(format),
        orientation,
    })
}

/// Encode and save as JPEG; JPEG has no alpha channel, so it is dropped.
fn save_jpeg(img: &DynamicImage, path: &Path, quality: Quality) -> Result<(), BackendError> {
    let file = std::fs::File::create(path)?;
    let writer = BufWriter::new(file);
    let encoder =
        image::codecs::jpeg::JpegEncoder::new_with_quality(writer, quality.value() as u8);
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    rgb.write_with_encoder(encoder)
        .map_err(|e| encode_error(path, e))
}

/// Encode and save as AVIF using rav1e (speed=6 for reasonable throughput).
fn save_avif(img: &DynamicImage, path: &Path, quality: Quality) -> Result<(), BackendError> {
    let file = std::fs::File::create(path)?;
    let writer = BufWriter::new(file);
    let encoder = image::codecs::avif::AvifEncoder::new_with_speed_quality(
        writer,
        6,
        quality.value() as u8,
    );
    img.write_with_encoder(encoder)
        .map_err(|e| encode_error(path, e))
}

fn encode_error(path: &Path, e: image::ImageError) -> BackendError {
    match e {
        image::ImageError::IoError(io) => BackendError::Io(io),
        other => BackendError::Encode {
            path: path.display().to_string(),
            message: other.to_string(),
        },
    }
}

impl ImageBackend for RustBackend {
    fn decode(&self, source: &Source<'_>) -> Result<SourceImage, BackendError> {
        match source {
            Source::Path(path) => {
                let bytes = std::fs::read(path)?;
                decode_bytes(&bytes)
            }
            Source::Bytes(bytes) => decode_bytes(bytes),
            Source::Decoded(img) => Ok(SourceImage {
                image: (*img).clone(),
                format: None,
                orientation: Orientation::Normal,
            }),
        }
    }

    fn save(&self, image: &DynamicImage, path: &Path) -> Result<(), BackendError> {
        let format = OutputFormat::from_path(path).ok_or_else(|| {
            BackendError::UnsupportedFormat(
                path.extension()
                    .map(|e| e.to_string_lossy().to_string())
                    .unwrap_or_else(|| "(no extension)".to_string()),
            )
        })?;

        if format.is_lossy() {
            debug!(path = %path.display(), ?format, quality = self.quality.value(), "encoding");
        } else {
            debug!(path = %path.display(), ?format, "encoding lossless");
        }

        match format {
            OutputFormat::Jpeg => save_jpeg(image, path, self.quality),
            OutputFormat::Avif => save_avif(image, path, self.quality),
            lossless => image
                .save_with_format(path, lossless.image_format())
                .map_err(|e| encode_error(path, e)),
        }
    }
}
