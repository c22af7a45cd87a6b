use serde::{Deserialize, Serialize};
use twoview_3d::{
    camera::PinholeCamera,
    linalg::{flatten33, inverse33, matmul33, Mat33},
};
use twoview_image::{ops::convert_from_f32, Image, ImageSize};
use twoview_imgproc::warp::{transform_point, warp_perspective};

use crate::StereoError;

/// Border cropped from the rectified images to remove the blank warp margins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RectifyPadding {
    /// Pixels removed on each side along the columns.
    pub u: usize,
    /// Pixels removed on each side along the rows.
    pub v: usize,
}

impl Default for RectifyPadding {
    fn default() -> Self {
        Self { u: 20, v: 20 }
    }
}

/// Axis aligned bounds of the warped image corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CornerBounds {
    /// Minimum column.
    pub u_min: f64,
    /// Maximum column.
    pub u_max: f64,
    /// Minimum row.
    pub v_min: f64,
    /// Maximum row.
    pub v_max: f64,
}

/// A rectified image pair with its corrected intrinsics.
#[derive(Debug, Clone)]
pub struct RectifiedPair {
    /// The rectified first view.
    pub left: Image<u8, 3>,
    /// The rectified second view.
    pub right: Image<u8, 3>,
    /// The corrected intrinsics of the first view.
    pub left_intrinsics: Mat33,
    /// The corrected intrinsics of the second view.
    pub right_intrinsics: Mat33,
    /// Disparity offset caused by the different row offsets, `cy_right - cy_left`.
    pub disparity_bias: f64,
}

/// Map the four corners `(0, 0), (w, 0), (w, h), (0, h)` through a homography and
/// return their bounding box.
///
/// # Arguments
///
/// * `size` - The size of the image to warp.
/// * `homography` - The src -> dst homography.
pub fn homography_corners(size: ImageSize, homography: &Mat33) -> CornerBounds {
    let (w, h) = (size.width as f64, size.height as f64);
    let m = flatten33(homography);

    let corners = [(0.0, 0.0), (w, 0.0), (w, h), (0.0, h)].map(|(x, y)| transform_point(x, y, &m));

    corners.iter().fold(
        CornerBounds {
            u_min: f64::INFINITY,
            u_max: f64::NEG_INFINITY,
            v_min: f64::INFINITY,
            v_max: f64::NEG_INFINITY,
        },
        |b, &(u, v)| CornerBounds {
            u_min: b.u_min.min(u),
            u_max: b.u_max.max(u),
            v_min: b.v_min.min(v),
            v_max: b.v_max.max(v),
        },
    )
}

/// Warp an image pair into a common rectified frame.
///
/// Each view is warped by `K_corr * R_rect * K⁻¹` where `K_corr` is the input
/// intrinsics shifted by the padding and by the top of the warped bounding box.
/// Both outputs share the size
///
/// * width: `floor(max(ui_max, uj_max)) - 2 * padding.u`
/// * height: `floor(min(vi_max - vi_min, vj_max - vj_min)) - 2 * padding.v`
///
/// # Arguments
///
/// * `rgb_i`, `rgb_j` - The input images, they must have the same size.
/// * `rect_r_i`, `rect_r_j` - The rectification rotations, `p_rect = R * p_cam`.
/// * `k_i`, `k_j` - The intrinsics, they must share the principal point column.
/// * `padding` - The border to crop.
///
/// # Errors
///
/// Fails on image size mismatch, principal point column mismatch, malformed
/// intrinsics, or when the rectified size collapses to zero.
pub fn rectify_pair(
    rgb_i: &Image<u8, 3>,
    rgb_j: &Image<u8, 3>,
    rect_r_i: &Mat33,
    rect_r_j: &Mat33,
    k_i: &Mat33,
    k_j: &Mat33,
    padding: RectifyPadding,
) -> Result<RectifiedPair, StereoError> {
    if rgb_i.size() != rgb_j.size() {
        return Err(StereoError::ImageShapeMismatch(rgb_i.size(), rgb_j.size()));
    }

    PinholeCamera::from_matrix(k_i)?;
    PinholeCamera::from_matrix(k_j)?;

    let k_i_inv = inverse33(k_i)?;
    let k_j_inv = inverse33(k_j)?;

    let size = rgb_i.size();
    let bounds_i = homography_corners(size, &matmul33(&matmul33(k_i, rect_r_i), &k_i_inv));
    let bounds_j = homography_corners(size, &matmul33(&matmul33(k_j, rect_r_j), &k_j_inv));

    let (u_pad, v_pad) = (padding.u as i64, padding.v as i64);
    let width = bounds_i.u_max.max(bounds_j.u_max).floor() as i64 - 2 * u_pad;
    let height = (bounds_i.v_max - bounds_i.v_min)
        .min(bounds_j.v_max - bounds_j.v_min)
        .floor() as i64
        - 2 * v_pad;

    if width <= 0 || height <= 0 {
        return Err(StereoError::EmptyRectification(width, height));
    }

    if k_i[0][2] != k_j[0][2] {
        return Err(StereoError::PrincipalPointMismatch(k_i[0][2], k_j[0][2]));
    }

    let mut k_i_corr = *k_i;
    k_i_corr[0][2] -= padding.u as f64;
    k_i_corr[1][2] -= bounds_i.v_min + padding.v as f64;

    let mut k_j_corr = *k_j;
    k_j_corr[0][2] -= padding.u as f64;
    k_j_corr[1][2] -= bounds_j.v_min + padding.v as f64;

    let homography_i = matmul33(&matmul33(&k_i_corr, rect_r_i), &k_i_inv);
    let homography_j = matmul33(&matmul33(&k_j_corr, rect_r_j), &k_j_inv);

    let out_size = ImageSize {
        width: width as usize,
        height: height as usize,
    };

    let left = warp_rgb(rgb_i, out_size, &homography_i)?;
    let right = warp_rgb(rgb_j, out_size, &homography_j)?;

    let disparity_bias = k_j_corr[1][2] - k_i_corr[1][2];

    log::debug!(
        "rectified {} -> {}, disparity bias {:.4}",
        size,
        out_size,
        disparity_bias
    );

    Ok(RectifiedPair {
        left,
        right,
        left_intrinsics: k_i_corr,
        right_intrinsics: k_j_corr,
        disparity_bias,
    })
}

fn warp_rgb(
    src: &Image<u8, 3>,
    size: ImageSize,
    homography: &Mat33,
) -> Result<Image<u8, 3>, StereoError> {
    let src_f32 = src.cast::<f32>()?;
    let mut dst = Image::<f32, 3>::from_size_val(size, 0.0)?;
    warp_perspective(&src_f32, &mut dst, &flatten33(homography))?;
    Ok(convert_from_f32::<u8, 3>(&dst)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use twoview_3d::linalg::IDENTITY33;

    fn intrinsics() -> Mat33 {
        [[50.0, 0.0, 32.0], [0.0, 50.0, 24.0], [0.0, 0.0, 1.0]]
    }

    fn ramp(size: ImageSize) -> Image<u8, 3> {
        Image::from_fn(size, |x, y, c| ((x + 3 * y + 7 * c) % 256) as u8)
    }

    #[test]
    fn test_homography_corners_identity() {
        let b = homography_corners([64, 48].into(), &IDENTITY33);
        assert_eq!(
            b,
            CornerBounds {
                u_min: 0.0,
                u_max: 64.0,
                v_min: 0.0,
                v_max: 48.0
            }
        );
    }

    #[test]
    fn test_homography_corners_shift() {
        let h = [[1.0, 0.0, -3.0], [0.0, 1.0, 2.5], [0.0, 0.0, 1.0]];
        let b = homography_corners([10, 20].into(), &h);
        assert_relative_eq!(b.u_min, -3.0);
        assert_relative_eq!(b.u_max, 7.0);
        assert_relative_eq!(b.v_min, 2.5);
        assert_relative_eq!(b.v_max, 22.5);
    }

    #[test]
    fn test_rectify_identity() -> Result<(), StereoError> {
        let size = ImageSize {
            width: 64,
            height: 48,
        };
        let rgb = ramp(size);
        let k = intrinsics();

        let pair = rectify_pair(
            &rgb,
            &rgb,
            &IDENTITY33,
            &IDENTITY33,
            &k,
            &k,
            RectifyPadding::default(),
        )?;

        assert_eq!(pair.left.size(), ImageSize::from([24, 8]));
        assert_eq!(pair.right.size(), pair.left.size());
        // K * I * K^-1 is the identity only up to rounding
        assert_relative_eq!(pair.left_intrinsics[0][2], 12.0, epsilon = 1e-9);
        assert_relative_eq!(pair.left_intrinsics[1][2], 4.0, epsilon = 1e-9);
        assert_relative_eq!(pair.disparity_bias, 0.0, epsilon = 1e-9);

        // the warp is a pure shift by the padding
        for y in 0..pair.left.height() {
            for x in 0..pair.left.width() {
                for c in 0..3 {
                    assert_eq!(
                        pair.left.get_pixel(x, y, c)?,
                        rgb.get_pixel(x + 20, y + 20, c)?
                    );
                }
            }
        }
        Ok(())
    }

    #[test]
    fn test_rectify_shape_mismatch() -> Result<(), StereoError> {
        let a = ramp([8, 8].into());
        let b = ramp([8, 9].into());
        let k = intrinsics();
        let res = rectify_pair(&a, &b, &IDENTITY33, &IDENTITY33, &k, &k, RectifyPadding::default());
        assert!(matches!(res, Err(StereoError::ImageShapeMismatch(..))));
        Ok(())
    }

    #[test]
    fn test_rectify_principal_point_mismatch() {
        let rgb = ramp([64, 48].into());
        let k_i = intrinsics();
        let mut k_j = intrinsics();
        k_j[0][2] += 1.0;
        let res = rectify_pair(
            &rgb,
            &rgb,
            &IDENTITY33,
            &IDENTITY33,
            &k_i,
            &k_j,
            RectifyPadding::default(),
        );
        assert!(matches!(res, Err(StereoError::PrincipalPointMismatch(..))));
    }

    #[test]
    fn test_rectify_empty() {
        let rgb = ramp([30, 30].into());
        let k = intrinsics();
        let res = rectify_pair(
            &rgb,
            &rgb,
            &IDENTITY33,
            &IDENTITY33,
            &k,
            &k,
            RectifyPadding { u: 20, v: 20 },
        );
        assert!(matches!(res, Err(StereoError::EmptyRectification(-10, -10))));
    }

    #[test]
    fn test_rectify_invalid_intrinsics() {
        let rgb = ramp([64, 48].into());
        let mut k = intrinsics();
        k[1][1] = 0.0;
        let res = rectify_pair(&rgb, &rgb, &IDENTITY33, &IDENTITY33, &k, &k, RectifyPadding::default());
        assert!(matches!(res, Err(StereoError::InvalidIntrinsics(_))));
    }
}
