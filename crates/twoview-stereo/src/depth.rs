use twoview_3d::{camera::PinholeCamera, linalg::Mat33};
use twoview_image::Image;

use crate::{StereoError, EPS};

/// Depth map and per-pixel camera-frame points.
#[derive(Debug, Clone, PartialEq)]
pub struct DepthOutput {
    /// Depth along the optical axis of every pixel.
    pub depth: Image<f64, 1>,
    /// The back-projected `(x, y, z)` of every pixel, in the camera frame.
    pub points: Image<f64, 3>,
}

/// Convert a disparity map to depth and back-project every pixel.
///
/// The depth is `fy * baseline / (disparity + EPS)`, with `fy` the vertical focal
/// length since the disparity runs along the image rows. Each pixel `(u, v)` is
/// back-projected with the inverse pinhole model of `intrinsics`.
///
/// # Errors
///
/// Returns [`StereoError::InvalidIntrinsics`] for a zero focal length.
pub fn compute_depth_and_points(
    disparity: &Image<f64, 1>,
    baseline: f64,
    intrinsics: &Mat33,
) -> Result<DepthOutput, StereoError> {
    let camera = PinholeCamera::from_matrix(intrinsics)?;
    let cols = disparity.cols();

    let depth_data = disparity
        .as_slice()
        .iter()
        .map(|d| camera.fy * baseline / (d + EPS))
        .collect::<Vec<_>>();

    let points_data = depth_data
        .iter()
        .enumerate()
        .flat_map(|(i, &z)| {
            let (u, v) = ((i % cols) as f64, (i / cols) as f64);
            camera.unproject(u, v, z)
        })
        .collect::<Vec<_>>();

    Ok(DepthOutput {
        depth: Image::new(disparity.size(), depth_data)?,
        points: Image::new(disparity.size(), points_data)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const K: Mat33 = [[120.0, 0.0, 4.5], [0.0, 100.0, 3.0], [0.0, 0.0, 1.0]];

    #[test]
    fn test_depth_from_disparity() -> Result<(), StereoError> {
        let disparity = Image::new([2, 1].into(), vec![5.0, 10.0])?;
        let out = compute_depth_and_points(&disparity, 0.1, &K)?;
        assert_relative_eq!(*out.depth.get_pixel(0, 0, 0)?, 2.0, epsilon = 1e-6);
        assert_relative_eq!(*out.depth.get_pixel(1, 0, 0)?, 1.0, epsilon = 1e-6);
        Ok(())
    }

    #[test]
    fn test_zero_disparity_is_finite() -> Result<(), StereoError> {
        let disparity = Image::new([1, 1].into(), vec![0.0])?;
        let out = compute_depth_and_points(&disparity, 0.1, &K)?;
        assert!(out.depth.as_slice()[0].is_finite());
        assert!(out.points.as_slice().iter().all(|v| v.is_finite()));
        Ok(())
    }

    #[test]
    fn test_backprojection_round_trip() -> Result<(), StereoError> {
        let (cols, rows) = (9, 7);
        let baseline = 0.2;
        let camera = PinholeCamera::from_matrix(&K)?;

        // synthetic depth ramp, converted to the disparity that produces it
        let disparity = Image::from_fn([cols, rows].into(), |x, y, _| {
            let z = 0.5 + 0.1 * x as f64 + 0.05 * y as f64;
            camera.fy * baseline / z
        });

        let out = compute_depth_and_points(&disparity, baseline, &K)?;
        for y in 0..rows {
            for x in 0..cols {
                let p = out.points.as_slice()[(y * cols + x) * 3..][..3].to_vec();
                let [u, v] = camera.project(&[p[0], p[1], p[2]]);
                assert_relative_eq!(u, x as f64, epsilon = 1e-9);
                assert_relative_eq!(v, y as f64, epsilon = 1e-9);
                assert_relative_eq!(
                    p[2],
                    0.5 + 0.1 * x as f64 + 0.05 * y as f64,
                    epsilon = 1e-6
                );
            }
        }
        Ok(())
    }

    #[test]
    fn test_invalid_intrinsics() -> Result<(), StereoError> {
        let disparity = Image::new([1, 1].into(), vec![1.0])?;
        let mut k = K;
        k[0][0] = 0.0;
        assert!(matches!(
            compute_depth_and_points(&disparity, 0.1, &k),
            Err(StereoError::InvalidIntrinsics(_))
        ));
        Ok(())
    }
}
