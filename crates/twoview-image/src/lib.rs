#![deny(missing_docs)]
//! Image types for generating and manipulating images in the two-view pipeline.

/// image representation for computer vision purposes.
pub mod image;

/// Error types for the image module.
pub mod error;

/// image level operations such as casting.
pub mod ops;

pub use crate::error::ImageError;
pub use crate::image::{Image, ImageDtype, ImageSize};
