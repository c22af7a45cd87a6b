use twoview_3d::{
    linalg::{matmul33, matvec33},
    outlier::{OutlierFilter, StatisticalOutlierRemoval},
    pointcloud::PointCloud,
};
use twoview_image::Image;

use crate::{
    config::StereoConfig,
    depth::compute_depth_and_points,
    disparity::compute_disparity,
    geometry::RelativePose,
    kernels::MatchingCost,
    patch::{PatchExtractor, ZeroPaddedPatches},
    postprocess::{postprocess, PostprocessOutput},
    rectify::{rectify_pair, RectifiedPair},
    StereoError, View,
};

/// Everything produced by a two-view reconstruction.
#[derive(Debug, Clone)]
pub struct TwoViewOutput {
    /// Pose of the second view relative to the first one.
    pub relative_pose: RelativePose,
    /// The rectified pair the disparity is computed on.
    pub rectified: RectifiedPair,
    /// Dense disparity of the rectified first view.
    pub disparity: Image<f64, 1>,
    /// Left-right consistency of the disparity.
    pub consistency: Image<u8, 1>,
    /// Dense depth of the rectified first view.
    pub depth: Image<f64, 1>,
    /// The filtered point cloud and its masks.
    pub filtered: PostprocessOutput,
}

impl TwoViewOutput {
    /// The reconstructed points in world coordinates.
    pub fn points_world(&self) -> &[[f64; 3]] {
        &self.filtered.points_world
    }

    /// The color of every reconstructed point.
    pub fn colors(&self) -> &[[u8; 3]] {
        &self.filtered.colors
    }

    /// The colored world point cloud.
    pub fn to_pointcloud(&self) -> PointCloud {
        PointCloud::new(
            self.filtered.points_world.clone(),
            Some(self.filtered.colors.clone()),
        )
    }
}

/// Reconstruct the scene seen by two calibrated views.
///
/// The first view must be the one the baseline points away from along its y
/// axis, see [`RelativePose::between`].
///
/// # Example
///
/// ```no_run
/// use twoview_image::Image;
/// use twoview_stereo::{two_view, StereoConfig, View};
///
/// let k = [[100.0, 0.0, 32.0], [0.0, 100.0, 24.0], [0.0, 0.0, 1.0]];
/// let identity = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
/// let rgb = Image::<u8, 3>::from_size_val([64, 48].into(), 0).unwrap();
///
/// let view_i = View::new(rgb.clone(), k, identity, [0.0, 0.1, 0.0]);
/// let view_j = View::new(rgb, k, identity, [0.0, 0.0, 0.0]);
///
/// let output = two_view(&view_i, &view_j, &StereoConfig::default()).unwrap();
/// println!("{} points", output.points_world().len());
/// ```
pub fn two_view(
    view_i: &View,
    view_j: &View,
    config: &StereoConfig,
) -> Result<TwoViewOutput, StereoError> {
    let outlier_filter = StatisticalOutlierRemoval::from(config.postprocess.outlier);
    two_view_with(
        view_i,
        view_j,
        config,
        &config.kernel,
        &ZeroPaddedPatches,
        &outlier_filter,
    )
}

/// Same as [`two_view`] with caller provided matching cost, patch extraction and
/// outlier classification.
///
/// The `kernel` field of `config` is ignored.
pub fn two_view_with<K, P, F>(
    view_i: &View,
    view_j: &View,
    config: &StereoConfig,
    kernel: &K,
    extractor: &P,
    outlier_filter: &F,
) -> Result<TwoViewOutput, StereoError>
where
    K: MatchingCost + ?Sized,
    P: PatchExtractor + ?Sized,
    F: OutlierFilter + ?Sized,
{
    // 1. rectify the views
    let relative_pose = RelativePose::between(
        &view_i.rotation,
        &view_i.translation,
        &view_j.rotation,
        &view_j.translation,
    )?;
    log::info!("baseline: {:.6}", relative_pose.baseline);

    let rect_r_i = relative_pose.rectification_rotation();
    let rect_r_j = matmul33(&rect_r_i, &relative_pose.rotation);

    let rectified = rectify_pair(
        &view_i.rgb,
        &view_j.rgb,
        &rect_r_i,
        &rect_r_j,
        &view_i.intrinsics,
        &view_j.intrinsics,
        config.padding,
    )?;

    let (k_i, k_j) = (&rectified.left_intrinsics, &rectified.right_intrinsics);
    if k_i[1][1] != k_j[1][1] {
        return Err(StereoError::FocalLengthMismatch(k_i[1][1], k_j[1][1]));
    }
    if k_i[0] != k_j[0] {
        return Err(StereoError::IntrinsicsRowMismatch(k_i[0], k_j[0]));
    }
    if rectified.left.size() != rectified.right.size() {
        return Err(StereoError::ImageShapeMismatch(
            rectified.left.size(),
            rectified.right.size(),
        ));
    }

    // 2. compute the disparity
    let disparity = compute_disparity(
        &rectified.left,
        &rectified.right,
        rectified.disparity_bias,
        config.patch_size,
        kernel,
        extractor,
        config.strategy,
    )?;

    // 3. back-project and filter
    let depth = compute_depth_and_points(
        &disparity.disparity,
        relative_pose.baseline,
        &rectified.left_intrinsics,
    )?;

    let c_r_w = matmul33(&rect_r_i, &view_i.rotation);
    let c_t_w = matvec33(&rect_r_i, &view_i.translation);

    let filtered = postprocess(
        &depth.depth,
        &rectified.left,
        &depth.points,
        &c_r_w,
        &c_t_w,
        Some(&disparity.consistency),
        &config.postprocess,
        outlier_filter,
    )?;

    log::info!("reconstructed {} points", filtered.points_world.len());

    Ok(TwoViewOutput {
        relative_pose,
        rectified,
        disparity: disparity.disparity,
        consistency: disparity.consistency,
        depth: depth.depth,
        filtered,
    })
}
