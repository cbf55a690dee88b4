//! Image codec backend trait and shared types.
//!
//! The [`ImageBackend`] trait is the boundary between the store and the pixel
//! codecs: it turns a [`Source`] into a decoded image (noting the EXIF
//! orientation of JPEG sources) and writes a finished image to disk.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! and `kamadak-exif` crates.

use super::orientation::Orientation;
use image::{DynamicImage, ImageFormat};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode image: {0}")]
    Decode(String),
    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),
    #[error("Failed to encode {path}: {message}")]
    Encode { path: String, message: String },
}

/// Where a pushed image comes from.
#[derive(Debug, Clone, Copy)]
pub enum Source<'a> {
    /// An encoded file on disk.
    Path(&'a Path),
    /// Encoded bytes already in memory (e.g. read from stdin).
    Bytes(&'a [u8]),
    /// An already decoded image. The store works on a copy.
    Decoded(&'a DynamicImage),
}

/// A decoded source plus what the codec learned about it.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pub image: DynamicImage,
    /// Container format, when the source was encoded.
    pub format: Option<ImageFormat>,
    /// EXIF orientation; always `Normal` for non-JPEG sources.
    pub orientation: Orientation,
}

impl SourceImage {
    /// Decoded image with orientation correction applied.
    pub fn into_oriented(self) -> DynamicImage {
        self.orientation.apply(self.image)
    }
}

/// Trait for image codec backends.
///
/// Backends must be `Sync`: the store saves profiles from rayon workers.
pub trait ImageBackend: Sync {
    /// Decode a source. Decoded handles are cloned, never aliased.
    fn decode(&self, source: &Source<'_>) -> Result<SourceImage, BackendError>;

    /// Encode `image` to `path`, picking the format from the extension.
    ///
    /// Parent directories are not created.
    fn save(&self, image: &DynamicImage, path: &Path) -> Result<(), BackendError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Mock backend that records saves without touching the filesystem.
    /// Uses Mutex (not RefCell) so it is Sync and works with rayon's par_iter.
    #[derive(Default)]
    pub struct MockBackend {
        pub decode_result: Mutex<Option<SourceImage>>,
        /// Saves whose path contains any of these fragments fail.
        pub failing_paths: Vec<String>,
        pub operations: Mutex<Vec<RecordedOp>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Decode(String),
        Save {
            path: String,
            width: u32,
            height: u32,
        },
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self::default()
        }

        /// Backend whose next decode yields `image` with `orientation`.
        pub fn with_image(image: DynamicImage, orientation: Orientation) -> Self {
            Self {
                decode_result: Mutex::new(Some(SourceImage {
                    image,
                    format: Some(ImageFormat::Jpeg),
                    orientation,
                })),
                ..Self::default()
            }
        }

        pub fn failing_on(mut self, fragment: &str) -> Self {
            self.failing_paths.push(fragment.to_string());
            self
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }

        /// Recorded saves sorted by path (profiles finish in any order).
        pub fn saves(&self) -> Vec<RecordedOp> {
            let mut saves: Vec<RecordedOp> = self
                .get_operations()
                .into_iter()
                .filter(|op| matches!(op, RecordedOp::Save { .. }))
                .collect();
            saves.sort_by(|a, b| format!("{a:?}").cmp(&format!("{b:?}")));
            saves
        }
    }

    impl ImageBackend for MockBackend {
        fn decode(&self, source: &Source<'_>) -> Result<SourceImage, BackendError> {
            let label = match source {
                Source::Path(p) => p.to_string_lossy().to_string(),
                Source::Bytes(b) => format!("<{} bytes>", b.len()),
                Source::Decoded(_) => "<decoded>".to_string(),
            };
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::Decode(label));

            if let Source::Decoded(img) = source {
                return Ok(SourceImage {
                    image: (*img).clone(),
                    format: None,
                    orientation: Orientation::Normal,
                });
            }
            self.decode_result
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| BackendError::Decode("No mock image".to_string()))
        }

        fn save(&self, image: &DynamicImage, path: &Path) -> Result<(), BackendError> {
            let path_str = path.to_string_lossy().to_string();
            if self.failing_paths.iter().any(|f| path_str.contains(f)) {
                return Err(BackendError::Io(std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "mock save failure",
                )));
            }
            self.operations.lock().unwrap().push(RecordedOp::Save {
                path: path_str,
                width: image.width(),
                height: image.height(),
            });
            Ok(())
        }
    }

    fn blank(width: u32, height: u32) -> DynamicImage {
        DynamicImage::new_rgb8(width, height)
    }

    #[test]
    fn mock_records_decode_and_save() {
        let backend = MockBackend::with_image(blank(8, 6), Orientation::Normal);

        let decoded = backend.decode(&Source::Path(Path::new("/in/a.jpg"))).unwrap();
        backend.save(&decoded.image, Path::new("/out/a.jpg")).unwrap();

        let ops = backend.get_operations();
        assert_eq!(ops.len(), 2);
        assert!(matches!(&ops[0], RecordedOp::Decode(p) if p == "/in/a.jpg"));
        assert!(matches!(
            &ops[1],
            RecordedOp::Save {
                width: 8,
                height: 6,
                ..
            }
        ));
    }

    #[test]
    fn mock_without_image_fails_decode() {
        let backend = MockBackend::new();
        let result = backend.decode(&Source::Bytes(&[1, 2, 3]));
        assert!(matches!(result, Err(BackendError::Decode(_))));
    }

    #[test]
    fn mock_failing_path_errors() {
        let backend = MockBackend::new().failing_on("thumb");
        let result = backend.save(&blank(2, 2), Path::new("/root/thumb/a.png"));
        assert!(result.is_err());
        assert!(backend.get_operations().is_empty());
    }

    #[test]
    fn into_oriented_applies_orientation() {
        let source = SourceImage {
            image: blank(8, 6),
            format: Some(ImageFormat::Jpeg),
            orientation: Orientation::Rotate90,
        };
        let img = source.into_oriented();
        assert_eq!((img.width(), img.height()), (6, 8));
    }
}
