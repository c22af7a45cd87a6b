use serde::{Deserialize, Serialize};
use twoview_3d::outlier::StatisticalOutlierRemoval;

use crate::{disparity::ExecutionStrategy, kernels::MatchingKernel, rectify::RectifyPadding};

/// Parameters of the statistical outlier removal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlierConfig {
    /// Number of neighbors used to estimate the local point density.
    pub nb_neighbors: usize,
    /// Standard deviation multiplier of the rejection threshold.
    pub std_ratio: f64,
}

impl Default for OutlierConfig {
    fn default() -> Self {
        Self {
            nb_neighbors: 10,
            std_ratio: 2.0,
        }
    }
}

impl From<OutlierConfig> for StatisticalOutlierRemoval {
    fn from(config: OutlierConfig) -> Self {
        StatisticalOutlierRemoval::new(config.nb_neighbors, config.std_ratio)
    }
}

/// Parameters of the point cloud filtering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostprocessConfig {
    /// Minimum HSV value, on a [0, 255] scale, of a foreground pixel.
    pub hsv_threshold: f32,
    /// Side of the elliptical element closing the holes of the foreground mask.
    pub close_kernel_size: usize,
    /// Points must lie strictly farther than this depth.
    pub z_near: f64,
    /// Points must lie strictly closer than this depth.
    pub z_far: f64,
    /// Statistical outlier removal parameters.
    pub outlier: OutlierConfig,
    /// Drop the pixels failing the left-right consistency check.
    pub use_consistency: bool,
}

impl Default for PostprocessConfig {
    fn default() -> Self {
        Self {
            hsv_threshold: 45.0,
            close_kernel_size: 11,
            z_near: 0.5,
            z_far: 0.6,
            outlier: OutlierConfig::default(),
            use_consistency: true,
        }
    }
}

/// Configuration of the two-view pipeline.
///
/// # Example
///
/// ```
/// use twoview_stereo::{kernels::MatchingKernel, StereoConfig};
///
/// let config = StereoConfig::default()
///     .with_patch_size(3)
///     .with_kernel(MatchingKernel::Zncc)
///     .with_depth_range(0.4, 0.7);
///
/// assert_eq!(config.patch_size, 3);
/// assert_eq!(config.postprocess.z_far, 0.7);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StereoConfig {
    /// Side of the square matching window, odd.
    pub patch_size: usize,
    /// The patch matching cost.
    pub kernel: MatchingKernel,
    /// Border cropped from the rectified images.
    pub padding: RectifyPadding,
    /// Point cloud filtering parameters.
    pub postprocess: PostprocessConfig,
    /// Scheduling of the per-column disparity search.
    pub strategy: ExecutionStrategy,
}

impl Default for StereoConfig {
    fn default() -> Self {
        Self {
            patch_size: 5,
            kernel: MatchingKernel::default(),
            padding: RectifyPadding::default(),
            postprocess: PostprocessConfig::default(),
            strategy: ExecutionStrategy::default(),
        }
    }
}

impl StereoConfig {
    /// Set the matching window size.
    pub fn with_patch_size(mut self, patch_size: usize) -> Self {
        self.patch_size = patch_size;
        self
    }

    /// Set the matching cost.
    pub fn with_kernel(mut self, kernel: MatchingKernel) -> Self {
        self.kernel = kernel;
        self
    }

    /// Set the rectification padding.
    pub fn with_padding(mut self, u: usize, v: usize) -> Self {
        self.padding = RectifyPadding { u, v };
        self
    }

    /// Set the accepted depth band.
    pub fn with_depth_range(mut self, z_near: f64, z_far: f64) -> Self {
        self.postprocess.z_near = z_near;
        self.postprocess.z_far = z_far;
        self
    }

    /// Set the foreground segmentation parameters.
    pub fn with_foreground(mut self, hsv_threshold: f32, close_kernel_size: usize) -> Self {
        self.postprocess.hsv_threshold = hsv_threshold;
        self.postprocess.close_kernel_size = close_kernel_size;
        self
    }

    /// Set the outlier removal parameters.
    pub fn with_outlier(mut self, nb_neighbors: usize, std_ratio: f64) -> Self {
        self.postprocess.outlier = OutlierConfig {
            nb_neighbors,
            std_ratio,
        };
        self
    }

    /// Enable or disable the left-right consistency mask.
    pub fn with_consistency(mut self, use_consistency: bool) -> Self {
        self.postprocess.use_consistency = use_consistency;
        self
    }

    /// Set the scheduling of the disparity search.
    pub fn with_strategy(mut self, strategy: ExecutionStrategy) -> Self {
        self.strategy = strategy;
        self
    }
}
