//! Pixel interpolation for image resampling.
//!
//! Sampling is bilinear: a weighted mix of the four pixels around the
//! sampling position.

mod bilinear;

/// Grid generation and coordinate mapping utilities.
pub mod grid;

pub(crate) use bilinear::bilinear_interpolation;
