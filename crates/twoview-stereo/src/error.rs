use twoview_3d::{camera::CameraError, linalg::LinalgError, outlier::OutlierError};
use twoview_image::{ImageError, ImageSize};

/// An error type for the stereo pipeline.
#[derive(Debug, thiserror::Error)]
pub enum StereoError {
    /// The two images of the pair have different sizes.
    #[error("Image shapes differ: {0} vs {1}")]
    ImageShapeMismatch(ImageSize, ImageSize),

    /// The two intrinsic matrices have a different horizontal principal point.
    #[error("Principal points differ along x: {0} vs {1}")]
    PrincipalPointMismatch(f64, f64),

    /// The baseline does not point along the positive y axis of the first view.
    #[error("View order is swapped, the baseline y component must be positive, got {0}")]
    InvalidViewOrder(f64),

    /// The patch size must be odd and positive.
    #[error("Patch size must be odd and positive, got {0}")]
    InvalidPatchSize(usize),

    /// The intrinsic matrix is malformed.
    #[error(transparent)]
    InvalidIntrinsics(#[from] CameraError),

    /// The corrected intrinsics disagree on the vertical focal length.
    #[error("Rectified views must share the vertical focal length: {0} vs {1}")]
    FocalLengthMismatch(f64, f64),

    /// The corrected intrinsics disagree on the first row.
    #[error("Rectified views must share the first intrinsics row: {0:?} vs {1:?}")]
    IntrinsicsRowMismatch([f64; 3], [f64; 3]),

    /// The rectified pair collapses to an empty image.
    #[error("Rectified image would be empty ({0}x{1})")]
    EmptyRectification(i64, i64),

    /// Image operation failed.
    #[error(transparent)]
    Image(#[from] ImageError),

    /// Linear algebra operation failed.
    #[error(transparent)]
    Linalg(#[from] LinalgError),

    /// Outlier classification failed.
    #[error(transparent)]
    Outlier(#[from] OutlierError),
}
