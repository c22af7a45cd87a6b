#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// color transformations module.
pub mod color;

/// utilities for interpolation.
pub mod interpolation;

/// morphological operations on binary and grayscale images.
pub mod morphology;

/// module containing parallization utilities.
pub mod parallel;

/// operations to threshold images.
pub mod threshold;

/// image geometric transformations module.
pub mod warp;
