use twoview_3d::linalg::{cross, inverse33, matmul33, matvec33, norm, Mat33};

use crate::{StereoError, EPS};

/// Relative pose between two views.
///
/// Maps points of the second view `j` into the frame of the first view `i`
/// as `p_i = rotation * p_j + translation`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelativePose {
    /// The rotation `i_R_j`.
    pub rotation: Mat33,
    /// The translation `i_T_j`.
    pub translation: [f64; 3],
    /// The baseline length `|i_T_j|`.
    pub baseline: f64,
}

impl RelativePose {
    /// Compute the pose of view `j` relative to view `i` from their world to camera extrinsics.
    ///
    /// # Arguments
    ///
    /// * `i_r_w`, `i_t_w` - World to camera transform of the first view.
    /// * `j_r_w`, `j_t_w` - World to camera transform of the second view.
    ///
    /// # Errors
    ///
    /// Returns [`StereoError::InvalidViewOrder`] when the baseline does not point along the
    /// positive y axis of the first view, which means the two views are swapped.
    pub fn between(
        i_r_w: &Mat33,
        i_t_w: &[f64; 3],
        j_r_w: &Mat33,
        j_t_w: &[f64; 3],
    ) -> Result<Self, StereoError> {
        let w_r_j = inverse33(j_r_w)?;
        let i_r_j = matmul33(i_r_w, &w_r_j);

        let rotated = matvec33(&i_r_j, j_t_w);
        let i_t_j = [
            i_t_w[0] - rotated[0],
            i_t_w[1] - rotated[1],
            i_t_w[2] - rotated[2],
        ];

        if i_t_j[1] <= 0.0 {
            return Err(StereoError::InvalidViewOrder(i_t_j[1]));
        }

        let baseline = norm(&i_t_j);
        log::debug!("relative translation {:?}, baseline {:.6}", i_t_j, baseline);

        Ok(Self {
            rotation: i_r_j,
            translation: i_t_j,
            baseline,
        })
    }

    /// The rectification rotation of the first view, see [`rectification_rotation`].
    pub fn rectification_rotation(&self) -> Mat33 {
        rectification_rotation(&self.translation)
    }
}

/// Build the rotation that aligns the baseline `i_T_j` with the y axis.
///
/// The rows are:
///
/// * `r1 = [t_y, -t_x, 0] / |.|`, perpendicular to the baseline in the image plane.
/// * `r2 = t / |t|`, the baseline direction.
/// * `r3 = r1 x r2`.
///
/// After rotating by this matrix the epipoles lie at infinity along the image
/// columns, so matching pixels share their column index.
pub fn rectification_rotation(i_t_j: &[f64; 3]) -> Mat33 {
    let row1 = [i_t_j[1], -i_t_j[0], 0.0];
    let n1 = norm(&row1) + EPS;
    let row1 = row1.map(|v| v / n1);

    let n2 = norm(i_t_j) + EPS;
    let row2 = i_t_j.map(|v| v / n2);

    let row3 = cross(&row1, &row2);

    [row1, row2, row3]
}
