//! Geometric image transformations using perspective warps (homographies).

mod perspective;

pub use perspective::{inverse_perspective_matrix, transform_point, warp_perspective};
