//! Pure calculation functions for crop and shrink geometry.
//!
//! All functions here are pure and testable without any I/O or images.
//! Degenerate inputs (zero sizes, non-positive or non-finite ratios) fail
//! with [`GeometryError`] instead of producing NaN or empty rectangles.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("cropping {width}x{height} to ratio {ratio} leaves an empty rectangle")]
    EmptyCrop { width: u32, height: u32, ratio: f64 },
}

/// Axis-aligned crop rectangle, `x1..x2` by `y1..y2` (end-exclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl CropRect {
    /// Rectangle covering a whole `width` x `height` image.
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            x1: 0,
            y1: 0,
            x2: width,
            y2: height,
        }
    }

    pub fn width(&self) -> u32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> u32 {
        self.y2 - self.y1
    }
}

fn check_source(source: (u32, u32)) -> Result<(), GeometryError> {
    if source.0 == 0 || source.1 == 0 {
        return Err(GeometryError::InvalidArgument(format!(
            "source dimensions must be positive, got {}x{}",
            source.0, source.1
        )));
    }
    Ok(())
}

/// Calculate the centered crop rectangle for a target aspect ratio.
///
/// Returns the largest rectangle of `ratio` (width / height) that fits inside
/// the source, centered on the axis being cropped. Edges are floored, so the
/// cropped dimension may be one pixel off the exact value.
///
/// # Examples
/// ```
/// # use imgstorage::imaging::{CropRect, calculate_crop_rect};
/// // 4:3 landscape cropped to a square keeps the middle 3456 columns
/// let rect = calculate_crop_rect((4608, 3456), 1.0).unwrap();
/// assert_eq!(rect, CropRect { x1: 576, y1: 0, x2: 4032, y2: 3456 });
/// ```
pub fn calculate_crop_rect(source: (u32, u32), ratio: f64) -> Result<CropRect, GeometryError> {
    check_source(source)?;
    if !ratio.is_finite() || ratio <= 0.0 {
        return Err(GeometryError::InvalidArgument(format!(
            "crop ratio must be a positive finite number, got {ratio}"
        )));
    }

    let (width, height) = source;
    let w = width as f64;
    let h = height as f64;
    let expected_width = h * ratio;

    let rect = if w < expected_width {
        // Too narrow: keep full width, crop top and bottom
        let expected_height = w / ratio;
        CropRect {
            x1: 0,
            y1: ((h - expected_height) / 2.0).floor() as u32,
            x2: width,
            y2: ((h + expected_height) / 2.0).floor() as u32,
        }
    } else if w > expected_width {
        // Too wide: keep full height, crop left and right
        CropRect {
            x1: ((w - expected_width) / 2.0).floor() as u32,
            y1: 0,
            x2: ((w + expected_width) / 2.0).floor() as u32,
            y2: height,
        }
    } else {
        CropRect::full(width, height)
    };

    if rect.width() == 0 || rect.height() == 0 {
        return Err(GeometryError::EmptyCrop {
            width,
            height,
            ratio,
        });
    }
    Ok(rect)
}

/// Calculate the largest size within `max` that preserves the source aspect ratio.
///
/// Never upscales: a source that already fits is returned unchanged. When both
/// dimensions overflow, the proportionally larger overflow drives the scale
/// (width wins ties). Results are truncated toward zero and clamped to at
/// least one pixel.
///
/// # Examples
/// ```
/// # use imgstorage::imaging::calculate_shrink_dimensions;
/// assert_eq!(calculate_shrink_dimensions((4608, 3456), (2000, 10000)).unwrap(), (2000, 1500));
/// assert_eq!(calculate_shrink_dimensions((800, 600), (1000, 1000)).unwrap(), (800, 600));
/// ```
pub fn calculate_shrink_dimensions(
    source: (u32, u32),
    max: (u32, u32),
) -> Result<(u32, u32), GeometryError> {
    check_source(source)?;
    if max.0 == 0 || max.1 == 0 {
        return Err(GeometryError::InvalidArgument(format!(
            "shrink bounds must be positive, got {}x{}",
            max.0, max.1
        )));
    }

    let (width, height) = source;
    let ratio_w = width as f64 / max.0 as f64;
    let ratio_h = height as f64 / max.1 as f64;

    let scale = match (ratio_w > 1.0, ratio_h > 1.0) {
        (false, false) => return Ok(source),
        (true, false) => 1.0 / ratio_w,
        (false, true) => 1.0 / ratio_h,
        (true, true) if ratio_w >= ratio_h => 1.0 / ratio_w,
        (true, true) => 1.0 / ratio_h,
    };

    let new_width = ((width as f64 * scale) as u32).max(1);
    let new_height = ((height as f64 * scale) as u32).max(1);
    Ok((new_width, new_height))
}
