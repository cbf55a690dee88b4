//! Shared test utilities for the imgstorage test suite.
//!
//! Provides synthetic JPEG builders (optionally carrying an EXIF orientation
//! tag) and [`MockRaster`], a dimensions-only image that records the
//! operations applied to it so filter chains can be checked at full camera
//! resolution without allocating pixels.

use crate::imaging::{CropRect, Raster};
use image::{ExtendedColorType, ImageEncoder, Rgb, RgbImage};
use std::path::Path;

// =========================================================================
// Synthetic JPEGs
// =========================================================================

/// Encode a `width` x `height` gradient as JPEG bytes.
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let mut buf = Vec::new();
    image::codecs::jpeg::JpegEncoder::new(&mut buf)
        .write_image(img.as_raw(), width, height, ExtendedColorType::Rgb8)
        .unwrap();
    buf
}

/// Encode a JPEG and splice in an APP1 segment carrying only an orientation tag.
pub fn jpeg_bytes_with_orientation(width: u32, height: u32, orientation: u16) -> Vec<u8> {
    let jpeg = jpeg_bytes(width, height);

    // Little-endian TIFF: header, IFD0 with one SHORT entry (0x0112), no next IFD
    let mut tiff = Vec::new();
    tiff.extend_from_slice(b"II");
    tiff.extend_from_slice(&42u16.to_le_bytes());
    tiff.extend_from_slice(&8u32.to_le_bytes());
    tiff.extend_from_slice(&1u16.to_le_bytes());
    tiff.extend_from_slice(&0x0112u16.to_le_bytes());
    tiff.extend_from_slice(&3u16.to_le_bytes());
    tiff.extend_from_slice(&1u32.to_le_bytes());
    tiff.extend_from_slice(&orientation.to_le_bytes());
    tiff.extend_from_slice(&[0, 0]);
    tiff.extend_from_slice(&0u32.to_le_bytes());

    let mut payload = b"Exif\0\0".to_vec();
    payload.extend_from_slice(&tiff);
    let segment_len = (payload.len() + 2) as u16;

    let mut out = Vec::with_capacity(jpeg.len() + payload.len() + 4);
    out.extend_from_slice(&jpeg[..2]); // SOI
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&segment_len.to_be_bytes());
    out.extend_from_slice(&payload);
    out.extend_from_slice(&jpeg[2..]);
    out
}

/// Write a gradient JPEG to `path`.
pub fn write_test_jpeg(path: &Path, width: u32, height: u32) {
    std::fs::write(path, jpeg_bytes(width, height)).unwrap();
}

// =========================================================================
// Dimensions-only raster
// =========================================================================

/// Operation recorded by [`MockRaster`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RasterOp {
    Crop(CropRect),
    Resize(u32, u32),
}

/// Stand-in image that tracks size and the history of operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockRaster {
    pub width: u32,
    pub height: u32,
    pub ops: Vec<RasterOp>,
}

impl MockRaster {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ops: Vec::new(),
        }
    }

    /// The 4608x3456 camera frame used throughout the filter tests.
    pub fn sample() -> Self {
        Self::new(4608, 3456)
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl Raster for MockRaster {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn crop_to(&self, rect: CropRect) -> Self {
        let mut ops = self.ops.clone();
        ops.push(RasterOp::Crop(rect));
        Self {
            width: rect.width(),
            height: rect.height(),
            ops,
        }
    }

    fn resize_to(&self, width: u32, height: u32) -> Self {
        let mut ops = self.ops.clone();
        ops.push(RasterOp::Resize(width, height));
        Self { width, height, ops }
    }
}
