//! Image geometry and codecs.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::ImageReader` (format sniffed from content) |
//! | **EXIF orientation** | `kamadak-exif`, tag 0x0112 |
//! | **Crop / Resize** | `crop_imm` / `resize_exact` with Lanczos3 |
//! | **Encode** | JPEG/AVIF with quality, PNG/WebP/TIFF lossless |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for crop and shrink math (unit testable)
//! - **Raster**: The [`Raster`] trait filters operate on
//! - **Orientation**: EXIF orientation model and correction
//! - **Parameters**: Encoding quality and output format
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]

pub mod backend;
mod calculations;
pub mod orientation;
mod params;
mod raster;
pub mod rust_backend;

pub use backend::{BackendError, ImageBackend, Source, SourceImage};
pub use calculations::{CropRect, GeometryError, calculate_crop_rect, calculate_shrink_dimensions};
pub use orientation::Orientation;
pub use params::{OutputFormat, Quality};
pub use raster::Raster;
pub use rust_backend::RustBackend;
