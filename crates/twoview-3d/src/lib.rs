#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Pinhole camera model.
pub mod camera;

/// I/O utilities for writing 3D data.
pub mod io;

/// Linear algebra utilities.
pub mod linalg;

/// Point cloud outlier classification.
pub mod outlier;

/// Point cloud container.
pub mod pointcloud;
