//! EXIF orientation (tag 0x0112) handling.
//!
//! Cameras store sensor-native pixels and record how the picture should be
//! turned in the EXIF orientation tag. The store corrects this once, before
//! any profile filter runs, so crop and shrink math see the image the way it
//! is meant to be viewed.

use exif::{In, Reader, Tag};
use image::DynamicImage;
use std::io::Cursor;

/// The eight EXIF orientations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    /// 1: no correction.
    #[default]
    Normal,
    /// 2: mirrored left to right.
    FlipHorizontal,
    /// 3: upside down.
    Rotate180,
    /// 4: mirrored top to bottom.
    FlipVertical,
    /// 5: mirrored, then rotated 90° counter-clockwise.
    Transpose,
    /// 6: rotate 90° clockwise to view.
    Rotate90,
    /// 7: mirrored, then rotated 90° clockwise.
    Transverse,
    /// 8: rotate 90° counter-clockwise to view.
    Rotate270,
}

impl Orientation {
    /// Map a raw tag value. Values outside 1..=8 mean no correction.
    pub fn from_exif(value: u32) -> Self {
        match value {
            2 => Self::FlipHorizontal,
            3 => Self::Rotate180,
            4 => Self::FlipVertical,
            5 => Self::Transpose,
            6 => Self::Rotate90,
            7 => Self::Transverse,
            8 => Self::Rotate270,
            _ => Self::Normal,
        }
    }

    /// Return a correctly oriented copy of `img`.
    pub fn apply(self, img: DynamicImage) -> DynamicImage {
        match self {
            Self::Normal => img,
            Self::FlipHorizontal => img.fliph(),
            Self::Rotate180 => img.rotate180(),
            Self::FlipVertical => img.flipv(),
            Self::Transpose => img.fliph().rotate270(),
            Self::Rotate90 => img.rotate90(),
            Self::Transverse => img.fliph().rotate90(),
            Self::Rotate270 => img.rotate270(),
        }
    }
}

/// Read the orientation tag from an encoded image (JPEG/TIFF container).
///
/// Missing or unreadable EXIF data yields [`Orientation::Normal`].
pub fn read_orientation(bytes: &[u8]) -> Orientation {
    let mut cursor = Cursor::new(bytes);
    let Ok(exif) = Reader::new().read_from_container(&mut cursor) else {
        return Orientation::Normal;
    };
    exif.get_field(Tag::Orientation, In::PRIMARY)
        .and_then(|field| field.value.get_uint(0))
        .map(Orientation::from_exif)
        .unwrap_or_default()
}
