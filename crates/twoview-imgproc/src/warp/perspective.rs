use crate::{
    interpolation::{bilinear_interpolation, grid::meshgrid_from_fn},
    parallel,
};

use twoview_image::{Image, ImageError};

#[rustfmt::skip]
fn determinant3x3(m: &[f64; 9]) -> f64 {
    m[0] * (m[4] * m[8] - m[5] * m[7]) -
    m[1] * (m[3] * m[8] - m[5] * m[6]) +
    m[2] * (m[3] * m[7] - m[4] * m[6])
}

#[rustfmt::skip]
fn adjugate3x3(m: &[f64; 9]) -> [f64; 9] {
    [
        m[4] * m[8] - m[5] * m[7],  // [0, 0]
        m[2] * m[7] - m[1] * m[8],  // [0, 1]
        m[1] * m[5] - m[2] * m[4],  // [0, 2]
        m[5] * m[6] - m[3] * m[8],  // [1, 0]
        m[0] * m[8] - m[2] * m[6],  // [1, 1]
        m[2] * m[3] - m[0] * m[5],  // [1, 2]
        m[3] * m[7] - m[4] * m[6],  // [2, 0]
        m[1] * m[6] - m[0] * m[7],  // [2, 1]
        m[0] * m[4] - m[1] * m[3],  // [2, 2]
    ]
}

/// Invert a row-major 3x3 perspective matrix.
///
/// # Errors
///
/// Returns [`ImageError::CannotComputeDeterminant`] if the matrix is singular.
pub fn inverse_perspective_matrix(m: &[f64; 9]) -> Result<[f64; 9], ImageError> {
    let det = determinant3x3(m);

    if det == 0.0 {
        return Err(ImageError::CannotComputeDeterminant);
    }

    let adj = adjugate3x3(m);
    let inv_det = 1.0 / det;

    let mut inv_m = [0.0; 9];
    for (dst, a) in inv_m.iter_mut().zip(adj.iter()) {
        *dst = a * inv_det;
    }

    Ok(inv_m)
}

/// Map a point through a row-major 3x3 homography, including the perspective divide.
pub fn transform_point(x: f64, y: f64, m: &[f64; 9]) -> (f64, f64) {
    let w = m[6] * x + m[7] * y + m[8];
    let xt = (m[0] * x + m[1] * y + m[2]) / w;
    let yt = (m[3] * x + m[4] * y + m[5]) / w;
    (xt, yt)
}

/// Applies a perspective transformation to an image with bilinear sampling.
///
/// Destination pixels whose source location falls outside the input image
/// keep their current value, so callers usually pass a zero-initialized `dst`.
///
/// * `src` - The input image with shape (height, width, channels).
/// * `dst` - The output image with shape (new_height, new_width, channels).
/// * `m` - The row-major 3x3 perspective transformation matrix src -> dst.
///
/// # Example
///
/// ```
/// use twoview_image::{Image, ImageSize};
/// use twoview_imgproc::warp::warp_perspective;
///
/// let src = Image::<f32, 1>::new(
///   ImageSize {
///     width: 4,
///     height: 5,
///   },
///   vec![0.0f32; 4 * 5]
/// ).unwrap();
///
/// let m = [1.0, 0.0, -1.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0];
///
/// let mut dst = Image::<f32, 1>::from_size_val(
///   ImageSize {
///     width: 2,
///     height: 3,
///   },
///   0.0
/// ).unwrap();
///
/// warp_perspective(&src, &mut dst, &m).unwrap();
///
/// assert_eq!(dst.size().width, 2);
/// assert_eq!(dst.size().height, 3);
/// ```
pub fn warp_perspective<const C: usize>(
    src: &Image<f32, C>,
    dst: &mut Image<f32, C>,
    m: &[f64; 9],
) -> Result<(), ImageError> {
    let inv_m = inverse_perspective_matrix(m)?;

    // find the source position of every destination pixel
    let (map_x, map_y) = meshgrid_from_fn(dst.cols(), dst.rows(), |x, y| {
        let (xsrc, ysrc) = transform_point(x as f64, y as f64, &inv_m);
        (xsrc as f32, ysrc as f32)
    });

    let (src_cols, src_rows) = (src.cols() as f32, src.rows() as f32);

    parallel::par_iter_rows_resample(dst, &map_x, &map_y, |&x, &y, dst_pixel| {
        if x >= 0.0f32 && x < src_cols && y >= 0.0f32 && y < src_rows {
            let pixel = bilinear_interpolation(src, x, y);
            dst_pixel.copy_from_slice(&pixel);
        }
    });

    Ok(())
}
