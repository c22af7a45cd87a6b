use crate::linalg::Mat33;

/// Error types for the camera module.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum CameraError {
    /// A focal length is zero or not finite.
    #[error("Invalid focal length (fx: {0}, fy: {1})")]
    InvalidFocalLength(f64, f64),

    /// The last row of the intrinsic matrix is not `[0, 0, 1]`.
    #[error("Intrinsic matrix last row must be [0, 0, 1], got {0:?}")]
    InvalidLastRow([f64; 3]),
}

/// Intrinsic parameters of a pinhole camera.
///
/// The camera matrix is
///
/// ```text
/// | fx  0 cx |
/// |  0 fy cy |
/// |  0  0  1 |
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinholeCamera {
    /// focal length in the x direction, in pixels.
    pub fx: f64,
    /// focal length in the y direction, in pixels.
    pub fy: f64,
    /// principal point column, in pixels.
    pub cx: f64,
    /// principal point row, in pixels.
    pub cy: f64,
}

impl PinholeCamera {
    /// Create a camera from its focal lengths and principal point.
    ///
    /// # Errors
    ///
    /// Returns [`CameraError::InvalidFocalLength`] for a zero or non finite focal length.
    pub fn new(fx: f64, fy: f64, cx: f64, cy: f64) -> Result<Self, CameraError> {
        if fx == 0.0 || fy == 0.0 || !fx.is_finite() || !fy.is_finite() {
            return Err(CameraError::InvalidFocalLength(fx, fy));
        }
        Ok(Self { fx, fy, cx, cy })
    }

    /// Create a camera from a 3x3 intrinsic matrix, the skew term is ignored.
    pub fn from_matrix(k: &Mat33) -> Result<Self, CameraError> {
        if k[2] != [0.0, 0.0, 1.0] {
            return Err(CameraError::InvalidLastRow(k[2]));
        }
        Self::new(k[0][0], k[1][1], k[0][2], k[1][2])
    }

    /// The 3x3 intrinsic matrix.
    pub fn matrix(&self) -> Mat33 {
        [
            [self.fx, 0.0, self.cx],
            [0.0, self.fy, self.cy],
            [0.0, 0.0, 1.0],
        ]
    }

    /// Project a camera-frame point to pixel coordinates `[u, v]`.
    pub fn project(&self, point: &[f64; 3]) -> [f64; 2] {
        [
            self.fx * point[0] / point[2] + self.cx,
            self.fy * point[1] / point[2] + self.cy,
        ]
    }

    /// Back-project the pixel `(u, v)` at the given depth to a camera-frame point.
    pub fn unproject(&self, u: f64, v: f64, depth: f64) -> [f64; 3] {
        [
            (u - self.cx) * depth / self.fx,
            (v - self.cy) * depth / self.fy,
            depth,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_project_unproject_roundtrip() -> Result<(), CameraError> {
        let camera = PinholeCamera::new(500.0, 480.0, 320.0, 240.0)?;
        for &(u, v, z) in &[(0.0, 0.0, 1.0), (100.5, 37.25, 0.55), (639.0, 479.0, 12.0)] {
            let p = camera.unproject(u, v, z);
            let [pu, pv] = camera.project(&p);
            assert_relative_eq!(pu, u, epsilon = 1e-9);
            assert_relative_eq!(pv, v, epsilon = 1e-9);
        }
        Ok(())
    }

    #[test]
    fn test_from_matrix() -> Result<(), CameraError> {
        let k = [[500.0, 0.0, 320.0], [0.0, 480.0, 240.0], [0.0, 0.0, 1.0]];
        let camera = PinholeCamera::from_matrix(&k)?;
        assert_eq!(camera.matrix(), k);
        Ok(())
    }

    #[test]
    fn test_zero_focal_length() {
        let k = [[0.0, 0.0, 320.0], [0.0, 480.0, 240.0], [0.0, 0.0, 1.0]];
        assert_eq!(
            PinholeCamera::from_matrix(&k),
            Err(CameraError::InvalidFocalLength(0.0, 480.0))
        );
    }

    #[test]
    fn test_invalid_last_row() {
        let k = [[500.0, 0.0, 320.0], [0.0, 480.0, 240.0], [0.0, 1.0, 1.0]];
        assert!(PinholeCamera::from_matrix(&k).is_err());
    }
}
