//! # imgstorage
//!
//! Image ingestion into named storage profiles. Every stored image is run
//! through a profile's filter chain (crop to an aspect ratio, resize, shrink
//! to fit) and written under `<root>/<profile>/<filename>`.
//!
//! ```text
//! source ─ decode ─ EXIF orientation ─┬─ original:  Identity                        → store/original/
//!                                     ├─ full:      Shrink (2000x2000)              → store/full/
//!                                     └─ thumbnail: Crop (1.00) → Shrink (256x256)  → store/thumbnail/
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`filter`] | Filter chains: `Identity`, `Crop`, `Resize`, `Shrink` as a linked chain |
//! | [`store`] | [`ImageStore`]: profiles, parallel push, listing |
//! | [`imaging`] | Geometry math, EXIF orientation, the [`imaging::ImageBackend`] codec seam |
//! | [`config`] | `imgstorage.toml` loading, validation, and merging onto stock defaults |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Pure Geometry
//!
//! Crop and shrink dimensions are computed by pure functions in
//! [`imaging::calculate_crop_rect`] and [`imaging::calculate_shrink_dimensions`].
//! Filters apply them through the [`imaging::Raster`] trait, so whole chains
//! are unit tested against a recording raster without decoding a pixel.
//!
//! ## Decode Once
//!
//! A push decodes and orients the source once. Each profile gets its own copy,
//! so chains never observe each other's output.
//!
//! ## Format From Filename
//!
//! The stored filename's extension picks the encoder. The same source can be
//! stored as `photo.jpg` in one call and `photo.png` in another.

pub mod config;
pub mod filter;
pub mod imaging;
pub mod output;
pub mod store;

pub use filter::{Filter, Transform};
pub use store::ImageStore;

#[cfg(test)]
pub(crate) mod test_helpers;
