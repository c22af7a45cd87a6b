//! Morphological image processing operations.

mod kernel;
mod ops;

pub use kernel::Kernel;
pub use ops::{close, dilate, erode};
