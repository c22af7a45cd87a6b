use std::num::NonZeroUsize;

use kiddo::immutable::float::kdtree::ImmutableKdTree;

/// Error types for the outlier module.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum OutlierError {
    /// The neighbor count must be at least one.
    #[error("Number of neighbors must be greater than zero")]
    InvalidNeighborCount,

    /// The standard deviation multiplier must be finite and non negative.
    #[error("Invalid standard deviation ratio {0}")]
    InvalidStdRatio(f64),
}

/// Classifies the points of an unordered point set as inliers or outliers.
pub trait OutlierFilter {
    /// Return the indices of the points classified as inliers, in ascending order.
    fn inliers(&self, points: &[[f64; 3]]) -> Result<Vec<usize>, OutlierError>;
}

/// Statistical outlier removal over the k nearest neighbors of each point.
///
/// For each point the mean distance to its `nb_neighbors + 1` nearest points,
/// itself included, is computed. Clouds smaller than that average over every
/// point. A point is an inlier when this mean distance is positive and strictly
/// below `mean + std_ratio * std` of the positive mean distances over the whole
/// cloud.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatisticalOutlierRemoval {
    /// Number of neighbors used to estimate the local mean distance.
    pub nb_neighbors: usize,
    /// Standard deviation multiplier of the rejection threshold.
    pub std_ratio: f64,
}

impl Default for StatisticalOutlierRemoval {
    fn default() -> Self {
        Self {
            nb_neighbors: 10,
            std_ratio: 2.0,
        }
    }
}

impl StatisticalOutlierRemoval {
    /// Create a new statistical outlier filter.
    pub fn new(nb_neighbors: usize, std_ratio: f64) -> Self {
        Self {
            nb_neighbors,
            std_ratio,
        }
    }

    fn mean_neighbor_distances(&self, points: &[[f64; 3]], k: NonZeroUsize) -> Vec<f64> {
        let kdtree: ImmutableKdTree<f64, u32, 3, 32> = ImmutableKdTree::new_from_slice(points);

        // the closest hit of every query is the query itself
        let k_with_self = k
            .saturating_add(1)
            .min(NonZeroUsize::new(points.len()).unwrap_or(NonZeroUsize::MIN));

        points
            .iter()
            .map(|p| {
                let neighbors = kdtree.nearest_n::<kiddo::SquaredEuclidean>(p, k_with_self);
                if neighbors.is_empty() {
                    return 0.0;
                }
                let sum = neighbors.iter().map(|nn| nn.distance.sqrt()).sum::<f64>();
                sum / neighbors.len() as f64
            })
            .collect()
    }
}

impl OutlierFilter for StatisticalOutlierRemoval {
    fn inliers(&self, points: &[[f64; 3]]) -> Result<Vec<usize>, OutlierError> {
        let k = NonZeroUsize::new(self.nb_neighbors).ok_or(OutlierError::InvalidNeighborCount)?;
        if !self.std_ratio.is_finite() || self.std_ratio < 0.0 {
            return Err(OutlierError::InvalidStdRatio(self.std_ratio));
        }

        if points.is_empty() {
            return Ok(Vec::new());
        }

        let avg_distances = self.mean_neighbor_distances(points, k);

        // a zero mean only happens for a point stacked on all its neighbors
        let valid = avg_distances
            .iter()
            .copied()
            .filter(|&d| d > 0.0)
            .collect::<Vec<_>>();
        if valid.is_empty() {
            log::debug!(
                "outlier removal: all {} points are coincident, rejecting them",
                points.len()
            );
            return Ok(Vec::new());
        }

        let n = valid.len() as f64;
        let mean = valid.iter().sum::<f64>() / n;
        let std = if valid.len() > 1 {
            (valid.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / (n - 1.0)).sqrt()
        } else {
            0.0
        };
        let threshold = mean + self.std_ratio * std;

        let inliers = avg_distances
            .iter()
            .enumerate()
            .filter(|(_, &d)| d > 0.0 && d < threshold)
            .map(|(i, _)| i)
            .collect::<Vec<_>>();

        log::debug!(
            "outlier removal: kept {}/{} points (threshold {:.6})",
            inliers.len(),
            points.len(),
            threshold
        );

        Ok(inliers)
    }
}
