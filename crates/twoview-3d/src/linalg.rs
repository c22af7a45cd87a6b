/// A row-major 3x3 matrix.
pub type Mat33 = [[f64; 3]; 3];

/// The 3x3 identity matrix.
pub const IDENTITY33: Mat33 = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];

/// Error types for the linear algebra module.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum LinalgError {
    /// The matrix has a zero determinant.
    #[error("Matrix is singular (determinant {0})")]
    SingularMatrix(f64),
}

/// Multiply two 3x3 matrices, `a * b`.
pub fn matmul33(a: &Mat33, b: &Mat33) -> Mat33 {
    let mut out = [[0.0; 3]; 3];
    for (i, row) in out.iter_mut().enumerate() {
        for (j, val) in row.iter_mut().enumerate() {
            *val = a[i][0] * b[0][j] + a[i][1] * b[1][j] + a[i][2] * b[2][j];
        }
    }
    out
}

/// Multiply a 3x3 matrix with a 3-vector, `m * v`.
pub fn matvec33(m: &Mat33, v: &[f64; 3]) -> [f64; 3] {
    [dot(&m[0], v), dot(&m[1], v), dot(&m[2], v)]
}

/// Transpose a 3x3 matrix.
pub fn transpose33(m: &Mat33) -> Mat33 {
    [
        [m[0][0], m[1][0], m[2][0]],
        [m[0][1], m[1][1], m[2][1]],
        [m[0][2], m[1][2], m[2][2]],
    ]
}

/// Determinant of a 3x3 matrix.
#[rustfmt::skip]
pub fn det33(m: &Mat33) -> f64 {
    m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1]) -
    m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0]) +
    m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
}

/// Invert a 3x3 matrix through its adjugate.
///
/// # Errors
///
/// Returns [`LinalgError::SingularMatrix`] if the determinant is zero.
pub fn inverse33(m: &Mat33) -> Result<Mat33, LinalgError> {
    let det = det33(m);
    if det == 0.0 || !det.is_finite() {
        return Err(LinalgError::SingularMatrix(det));
    }

    let inv_det = 1.0 / det;
    let adj = [
        [
            m[1][1] * m[2][2] - m[1][2] * m[2][1],
            m[0][2] * m[2][1] - m[0][1] * m[2][2],
            m[0][1] * m[1][2] - m[0][2] * m[1][1],
        ],
        [
            m[1][2] * m[2][0] - m[1][0] * m[2][2],
            m[0][0] * m[2][2] - m[0][2] * m[2][0],
            m[0][2] * m[1][0] - m[0][0] * m[1][2],
        ],
        [
            m[1][0] * m[2][1] - m[1][1] * m[2][0],
            m[0][1] * m[2][0] - m[0][0] * m[2][1],
            m[0][0] * m[1][1] - m[0][1] * m[1][0],
        ],
    ];

    Ok(adj.map(|row| row.map(|v| v * inv_det)))
}

/// Flatten a 3x3 matrix into a row-major array.
pub fn flatten33(m: &Mat33) -> [f64; 9] {
    [
        m[0][0], m[0][1], m[0][2], m[1][0], m[1][1], m[1][2], m[2][0], m[2][1], m[2][2],
    ]
}

/// Dot product of two 3-vectors.
pub fn dot(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

/// Cross product of two 3-vectors, `a x b`.
pub fn cross(a: &[f64; 3], b: &[f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

/// Euclidean norm of a 3-vector.
pub fn norm(v: &[f64; 3]) -> f64 {
    dot(v, v).sqrt()
}

/// Invert the rigid transform `p_dst = R * p_src + t`.
///
/// Returns `(Rᵀ, -Rᵀ t)` so that `p_src = Rᵀ * p_dst - Rᵀ t`.
///
/// PRECONDITION: `dst_r_src` is orthonormal.
pub fn rigid_inverse(dst_r_src: &Mat33, dst_t_src: &[f64; 3]) -> (Mat33, [f64; 3]) {
    let src_r_dst = transpose33(dst_r_src);
    let t = matvec33(&src_r_dst, dst_t_src);
    (src_r_dst, [-t[0], -t[1], -t[2]])
}

/// Transform a set of points using a rotation and translation.
///
/// # Arguments
///
/// * `src_points` - A set of points to be transformed.
/// * `dst_r_src` - A rotation matrix.
/// * `dst_t_src` - A translation vector.
/// * `dst_points` - A pre-allocated vector to store the transformed points.
///
/// PRECONDITION: dst_points is a pre-allocated vector of the same size as source.
///
/// Example:
///
/// ```
/// use twoview_3d::linalg::transform_points;
///
/// let src_points = vec![[2.0, 2.0, 2.0], [3.0, 4.0, 5.0]];
/// let rotation = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
/// let translation = [0.0, 0.0, 0.0];
/// let mut dst_points = vec![[0.0; 3]; src_points.len()];
/// transform_points(&src_points, &rotation, &translation, &mut dst_points);
/// assert_eq!(dst_points, src_points);
/// ```
pub fn transform_points(
    src_points: &[[f64; 3]],
    dst_r_src: &Mat33,
    dst_t_src: &[f64; 3],
    dst_points: &mut [[f64; 3]],
) {
    assert_eq!(src_points.len(), dst_points.len());

    if src_points.is_empty() {
        return;
    }

    let num_points = src_points.len();
    let rotation_flat = flatten33(dst_r_src);
    let dst_r_src_mat = faer::mat::from_row_major_slice(rotation_flat.as_slice(), 3, 3);

    // Nx3 matrix where each row is a point
    let src_flat = src_points
        .iter()
        .flat_map(|p| p.iter().copied())
        .collect::<Vec<_>>();
    let points_in_src = faer::mat::from_row_major_slice(src_flat.as_slice(), num_points, 3);

    // 3xN matrix where each column is a point
    let mut dst_flat = vec![0.0; num_points * 3];
    {
        let mut points_in_dst = faer::mat::from_column_major_slice_mut(dst_flat.as_mut_slice(), 3, num_points);

        faer::linalg::matmul::matmul(
            &mut points_in_dst,
            dst_r_src_mat,
            points_in_src.transpose(),
            None,
            1.0,
            faer::Parallelism::None,
        );
    }

    for (dst, rotated) in dst_points.iter_mut().zip(dst_flat.chunks_exact(3)) {
        *dst = [
            rotated[0] + dst_t_src[0],
            rotated[1] + dst_t_src[1],
            rotated[2] + dst_t_src[2],
        ];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn rotation_x(angle: f64) -> Mat33 {
        let (s, c) = angle.sin_cos();
        [[1.0, 0.0, 0.0], [0.0, c, -s], [0.0, s, c]]
    }

    #[test]
    fn test_transform_points_identity() {
        let src_points = vec![[2.0, 2.0, 2.0], [3.0, 4.0, 5.0]];
        let mut dst_points = vec![[0.0; 3]; src_points.len()];
        transform_points(&src_points, &IDENTITY33, &[0.0; 3], &mut dst_points);
        assert_eq!(dst_points, src_points);
    }

    #[test]
    fn test_transform_points_roundtrip() {
        let src_points = vec![[2.0, 2.0, 2.0], [3.0, 4.0, 5.0], [-1.0, 0.5, 7.0]];
        let rotation = rotation_x(0.3);
        let translation = [1.0, 2.0, 3.0];

        let mut dst_points = vec![[0.0; 3]; src_points.len()];
        transform_points(&src_points, &rotation, &translation, &mut dst_points);

        let (rotation_inv, translation_inv) = rigid_inverse(&rotation, &translation);
        let mut dst_points_src = vec![[0.0; 3]; dst_points.len()];
        transform_points(
            &dst_points,
            &rotation_inv,
            &translation_inv,
            &mut dst_points_src,
        );

        for (a, b) in dst_points_src.iter().zip(src_points.iter()) {
            for k in 0..3 {
                assert_relative_eq!(a[k], b[k], epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_transform_points_matches_matvec() {
        let rotation = rotation_x(1.1);
        let translation = [0.5, -0.25, 2.0];
        let p = [0.3, -1.2, 4.0];
        let mut out = [[0.0; 3]];
        transform_points(&[p], &rotation, &translation, &mut out);
        let expected = matvec33(&rotation, &p);
        for k in 0..3 {
            assert_relative_eq!(out[0][k], expected[k] + translation[k], epsilon = 1e-12);
        }
    }

    #[test]
    fn test_inverse33() -> Result<(), LinalgError> {
        let k = [[500.0, 0.0, 320.0], [0.0, 450.0, 240.0], [0.0, 0.0, 1.0]];
        let k_inv = inverse33(&k)?;
        let id = matmul33(&k, &k_inv);
        for i in 0..3 {
            for j in 0..3 {
                assert_relative_eq!(id[i][j], IDENTITY33[i][j], epsilon = 1e-12);
            }
        }
        Ok(())
    }

    #[test]
    fn test_inverse33_singular() {
        let m = [[1.0, 2.0, 3.0], [2.0, 4.0, 6.0], [0.0, 0.0, 1.0]];
        assert_eq!(inverse33(&m), Err(LinalgError::SingularMatrix(0.0)));
    }

    #[test]
    fn test_cross_right_handed() {
        assert_eq!(cross(&[1.0, 0.0, 0.0], &[0.0, 1.0, 0.0]), [0.0, 0.0, 1.0]);
        assert_relative_eq!(norm(&[3.0, 4.0, 0.0]), 5.0);
    }

    #[test]
    fn test_rigid_inverse_composes_to_identity() {
        let rotation = rotation_x(-0.7);
        let translation = [0.1, 0.2, 0.3];
        let (r_inv, t_inv) = rigid_inverse(&rotation, &translation);
        let r = matmul33(&r_inv, &rotation);
        let t = matvec33(&r_inv, &translation);
        for i in 0..3 {
            assert_relative_eq!(t[i] + t_inv[i], 0.0, epsilon = 1e-12);
            for j in 0..3 {
                assert_relative_eq!(r[i][j], IDENTITY33[i][j], epsilon = 1e-12);
            }
        }
    }
}
