//! Filter chains.
//!
//! A [`Filter`] is one node of a singly linked chain: it owns a [`Transform`]
//! and, optionally, the rest of the chain after it. Applying the head runs
//! every transform in insertion order:
//!
//! ```text
//! Crop(1.0) ──▶ Shrink(256x256) ──▶ (end)
//!   4608x3456 → 3456x3456 → 256x256
//! ```
//!
//! Nodes own their successors, so appending can only ever extend the tail and
//! a chain cannot loop back on itself.
//!
//! ## Variants
//!
//! | Transform | Effect |
//! |---|---|
//! | `Identity` | passes the image through |
//! | `Crop { ratio }` | centered crop to `ratio` = width / height |
//! | `Resize { width, height }` | exact Lanczos3 resize, aspect discarded |
//! | `Shrink { max_width, max_height }` | aspect-preserving downscale into bounds, never upscales |
//!
//! Transforms deserialize from config as internally tagged tables:
//! `{ type = "shrink", max_width = 256, max_height = 256 }`.

use crate::imaging::{GeometryError, Raster, calculate_crop_rect, calculate_shrink_dimensions};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// Bound used by [`Transform::Shrink`] when a dimension is left unset.
///
/// Large enough that no real image triggers a shrink on that axis.
pub const UNBOUNDED: u32 = 100_000;

fn unbounded() -> u32 {
    UNBOUNDED
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    #[error("invalid {filter} parameter: {reason}")]
    InvalidParameter { filter: &'static str, reason: String },
    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

/// The local operation a single filter node performs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", deny_unknown_fields)]
pub enum Transform {
    Identity {},
    Crop {
        ratio: f64,
    },
    Resize {
        width: u32,
        height: u32,
    },
    Shrink {
        #[serde(default = "unbounded")]
        max_width: u32,
        #[serde(default = "unbounded")]
        max_height: u32,
    },
}

impl Transform {
    /// Check parameters are usable: positive finite ratio, non-zero sizes.
    pub fn validate(&self) -> Result<(), FilterError> {
        match *self {
            Self::Identity {} => Ok(()),
            Self::Crop { ratio } if !ratio.is_finite() || ratio <= 0.0 => {
                Err(FilterError::InvalidParameter {
                    filter: "crop",
                    reason: format!("ratio must be a positive number, got {ratio}"),
                })
            }
            Self::Crop { .. } => Ok(()),
            Self::Resize { width, height } if width == 0 || height == 0 => {
                Err(FilterError::InvalidParameter {
                    filter: "resize",
                    reason: format!("size must be non-zero, got {width}x{height}"),
                })
            }
            Self::Resize { .. } => Ok(()),
            Self::Shrink {
                max_width,
                max_height,
            } if max_width == 0 || max_height == 0 => Err(FilterError::InvalidParameter {
                filter: "shrink",
                reason: format!("bounds must be non-zero, got {max_width}x{max_height}"),
            }),
            Self::Shrink { .. } => Ok(()),
        }
    }

    /// Run this transform alone, without forwarding to any successor.
    pub fn apply_local<R: Raster>(&self, image: R) -> Result<R, FilterError> {
        let source = image.dimensions();
        match *self {
            Self::Identity {} => Ok(image),
            Self::Crop { ratio } => {
                let rect = calculate_crop_rect(source, ratio)?;
                debug!(?source, ?rect, ratio, "crop");
                if (rect.width(), rect.height()) == source {
                    return Ok(image);
                }
                Ok(image.crop_to(rect))
            }
            Self::Resize { width, height } => {
                debug!(?source, width, height, "resize");
                Ok(image.resize_to(width, height))
            }
            Self::Shrink {
                max_width,
                max_height,
            } => {
                let target = calculate_shrink_dimensions(source, (max_width, max_height))?;
                if target == source {
                    debug!(?source, max_width, max_height, "shrink not needed");
                    return Ok(image);
                }
                Self::Resize {
                    width: target.0,
                    height: target.1,
                }
                .apply_local(image)
            }
        }
    }
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identity {} => write!(f, "Identity"),
            Self::Crop { ratio } => write!(f, "Crop ({ratio:.2})"),
            Self::Resize { width, height } => write!(f, "Resize ({width}x{height})"),
            Self::Shrink {
                max_width,
                max_height,
            } => write!(f, "Shrink ({max_width}x{max_height})"),
        }
    }
}

/// One node of a filter chain; the head node stands for the whole chain.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    transform: Transform,
    next: Option<Box<Filter>>,
}

impl Default for Filter {
    fn default() -> Self {
        Self::identity()
    }
}

impl Filter {
    /// Single-node chain after validating `transform`.
    pub fn new(transform: Transform) -> Result<Self, FilterError> {
        transform.validate()?;
        Ok(Self {
            transform,
            next: None,
        })
    }

    /// Pass-through filter.
    pub fn identity() -> Self {
        Self {
            transform: Transform::Identity {},
            next: None,
        }
    }

    /// Centered crop to `ratio` (width / height).
    pub fn crop(ratio: f64) -> Result<Self, FilterError> {
        Self::new(Transform::Crop { ratio })
    }

    /// Exact resize to `width` x `height`.
    pub fn resize(width: u32, height: u32) -> Result<Self, FilterError> {
        Self::new(Transform::Resize { width, height })
    }

    /// Aspect-preserving downscale to fit `max_width` x `max_height`.
    pub fn shrink(max_width: u32, max_height: u32) -> Result<Self, FilterError> {
        Self::new(Transform::Shrink {
            max_width,
            max_height,
        })
    }

    /// Build a chain from transforms in order. An empty list gives an identity chain.
    pub fn chain<I>(transforms: I) -> Result<Self, FilterError>
    where
        I: IntoIterator<Item = Transform>,
    {
        let mut transforms = transforms.into_iter();
        let Some(first) = transforms.next() else {
            return Ok(Self::identity());
        };
        let mut head = Self::new(first)?;
        for transform in transforms {
            head.append(Self::new(transform)?);
        }
        Ok(head)
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn next(&self) -> Option<&Filter> {
        self.next.as_deref()
    }

    /// Label of this node alone.
    pub fn name(&self) -> String {
        self.transform.to_string()
    }

    /// Labels of every node, head first.
    pub fn chain_names(&self) -> Vec<String> {
        self.iter().map(Filter::name).collect()
    }

    /// Number of nodes in the chain starting here.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Always false: a chain has at least its head.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Walk the chain from this node to the tail.
    pub fn iter(&self) -> Iter<'_> {
        Iter { node: Some(self) }
    }

    /// Attach `filter` (and whatever it already chains to) at the tail.
    ///
    /// Returns the node it was called on so appends can be strung together.
    pub fn append(&mut self, filter: Filter) -> &mut Self {
        match self.next.as_mut() {
            Some(next) => {
                next.append(filter);
            }
            None => self.next = Some(Box::new(filter)),
        }
        self
    }

    /// By-value form of [`append`](Self::append) for building chains inline.
    pub fn then(mut self, filter: Filter) -> Self {
        self.append(filter);
        self
    }

    /// Apply this node's transform, then hand the result to the rest of the chain.
    pub fn apply<R: Raster>(&self, image: R) -> Result<R, FilterError> {
        let out = self.transform.apply_local(image)?;
        match &self.next {
            Some(next) => next.apply(out),
            None => Ok(out),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.chain_names().join(" → "))
    }
}

/// Iterator over the nodes of a chain, see [`Filter::iter`].
pub struct Iter<'a> {
    node: Option<&'a Filter>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Filter;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.node?;
        self.node = node.next();
        Some(node)
    }
}

impl<'a> IntoIterator for &'a Filter {
    type Item = &'a Filter;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
