#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Pipeline configuration.
pub mod config;

/// Depth map and camera-frame point cloud from disparity.
pub mod depth;

/// Per-column disparity search with left-right consistency.
pub mod disparity;

/// Error types for the stereo pipeline.
pub mod error;

/// Relative pose and rectification rotation.
pub mod geometry;

/// Patch similarity kernels.
pub mod kernels;

/// Dense patch extraction.
pub mod patch;

/// The end-to-end two-view pipeline.
pub mod pipeline;

/// Masking, outlier removal and world transform of the reconstructed points.
pub mod postprocess;

/// Homography rectification of an image pair.
pub mod rectify;

/// Calibrated input view.
pub mod view;

pub use crate::config::StereoConfig;
pub use crate::error::StereoError;
pub use crate::pipeline::{two_view, TwoViewOutput};
pub use crate::view::View;

/// Regularization constant shared by every division that may hit zero.
pub const EPS: f64 = 1e-8;
