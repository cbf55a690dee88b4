//! The image contract filter chains operate on.
//!
//! A [`Raster`] knows its size and can produce cropped or resized copies of
//! itself. Filters only ever see this trait, so the geometry can be tested
//! against a dimensions-only stand-in while production code runs on
//! [`DynamicImage`].

use super::calculations::CropRect;
use image::DynamicImage;
use image::imageops::FilterType;

/// An image value that filters can crop and resize.
///
/// Implementations must return new values and leave `self` untouched.
pub trait Raster: Sized {
    /// Current `(width, height)` in pixels.
    fn dimensions(&self) -> (u32, u32);

    /// Copy of the region covered by `rect`.
    fn crop_to(&self, rect: CropRect) -> Self;

    /// Copy resampled to exactly `width` x `height`, ignoring aspect ratio.
    fn resize_to(&self, width: u32, height: u32) -> Self;
}

impl Raster for DynamicImage {
    fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    fn crop_to(&self, rect: CropRect) -> Self {
        self.crop_imm(rect.x1, rect.y1, rect.width(), rect.height())
    }

    fn resize_to(&self, width: u32, height: u32) -> Self {
        self.resize_exact(width, height, FilterType::Lanczos3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Rgb, RgbImage};

    fn gradient(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, 64])
        }))
    }

    #[test]
    fn crop_to_takes_the_rect_region() {
        let img = gradient(40, 20);
        let cropped = img.crop_to(CropRect {
            x1: 10,
            y1: 0,
            x2: 30,
            y2: 20,
        });
        assert_eq!(Raster::dimensions(&cropped), (20, 20));
        // Pixel (0, 0) of the crop is pixel (10, 0) of the source
        assert_eq!(cropped.get_pixel(0, 0), img.get_pixel(10, 0));
    }

    #[test]
    fn crop_to_leaves_source_untouched() {
        let img = gradient(40, 20);
        let _ = img.crop_to(CropRect::full(10, 10));
        assert_eq!(Raster::dimensions(&img), (40, 20));
    }

    #[test]
    fn resize_to_ignores_aspect_ratio() {
        let img = gradient(40, 20);
        let resized = img.resize_to(16, 16);
        assert_eq!(Raster::dimensions(&resized), (16, 16));
    }
}
