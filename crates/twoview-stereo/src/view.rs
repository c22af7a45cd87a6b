use twoview_3d::linalg::{rigid_inverse, Mat33};
use twoview_image::Image;

/// A calibrated camera view.
///
/// The extrinsics map world points into the camera frame as
/// `p_cam = rotation * p_world + translation`.
#[derive(Debug, Clone)]
pub struct View {
    /// The RGB image of the view.
    pub rgb: Image<u8, 3>,
    /// The 3x3 intrinsic matrix.
    pub intrinsics: Mat33,
    /// World to camera rotation.
    pub rotation: Mat33,
    /// World to camera translation.
    pub translation: [f64; 3],
}

impl View {
    /// Create a new view.
    pub fn new(rgb: Image<u8, 3>, intrinsics: Mat33, rotation: Mat33, translation: [f64; 3]) -> Self {
        Self {
            rgb,
            intrinsics,
            rotation,
            translation,
        }
    }

    /// The camera center in world coordinates, `-Rᵀ T`.
    pub fn camera_center(&self) -> [f64; 3] {
        rigid_inverse(&self.rotation, &self.translation).1
    }
}
