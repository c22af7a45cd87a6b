use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use twoview_image::Image;

use crate::{
    kernels::MatchingCost,
    patch::{normalize_rgb, PatchExtractor},
    StereoError,
};

/// How the independent per-column searches are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStrategy {
    /// Distribute the columns over the global rayon thread pool.
    #[default]
    Parallel,
    /// Process the columns one after the other on the current thread.
    Serial,
}

/// Dense disparity and left-right consistency of a rectified pair.
#[derive(Debug, Clone, PartialEq)]
pub struct DisparityOutput {
    /// Row offset of the best match plus the disparity bias, `i - j* + d0`.
    pub disparity: Image<f64, 1>,
    /// 1 where the reverse search of the chosen match returns to the pixel, 0 otherwise.
    pub consistency: Image<u8, 1>,
}

/// Best matches of one image column.
#[derive(Debug, Clone, PartialEq)]
struct ColumnMatch {
    disparity: Vec<f64>,
    consistency: Vec<u8>,
}

/// Index of the first minimum of an iterator, 0 for an empty one.
fn argmin(values: impl Iterator<Item = f64>) -> usize {
    let mut best = (0, f64::INFINITY);
    for (i, v) in values.enumerate() {
        if v < best.1 {
            best = (i, v);
        }
    }
    best.0
}

/// Select the best match of every row from a `rows x rows` cost matrix.
///
/// Candidates with `i - j + bias <= 0` are saturated to `max + 1` before the
/// search. The reverse search scans the same saturated matrix, so it is only
/// constrained through the saturated entries. A row where every candidate is
/// saturated picks `j = 0`.
fn match_column(mut cost: Vec<f64>, rows: usize, bias: f64) -> ColumnMatch {
    let saturated = cost.iter().copied().fold(f64::NEG_INFINITY, f64::max) + 1.0;

    for (i, row) in cost.chunks_exact_mut(rows.max(1)).enumerate() {
        for (j, c) in row.iter_mut().enumerate() {
            if i as f64 - j as f64 + bias <= 0.0 {
                *c = saturated;
            }
        }
    }

    let best_right = cost
        .chunks_exact(rows.max(1))
        .map(|row| argmin(row.iter().copied()))
        .collect::<Vec<_>>();

    let mut disparity = Vec::with_capacity(rows);
    let mut consistency = Vec::with_capacity(rows);
    for (i, &j) in best_right.iter().enumerate() {
        let best_left = argmin((0..rows).map(|r| cost[r * rows + j]));
        consistency.push(u8::from(best_left == i));
        disparity.push(i as f64 - j as f64 + bias);
    }

    ColumnMatch {
        disparity,
        consistency,
    }
}

/// Compute the disparity map of a rectified pair.
///
/// Corresponding pixels share their column, so for every column the patches of
/// both images are compared all against all and each left row takes the right
/// row with the lowest cost, subject to a strictly positive disparity.
///
/// # Arguments
///
/// * `left`, `right` - The rectified images, they must have the same size.
/// * `disparity_bias` - The offset `d0` between the principal point rows of the two views.
/// * `patch_size` - Side of the square matching window, odd.
/// * `kernel` - The matching cost.
/// * `extractor` - Builds the patch buffers of both images.
/// * `strategy` - Schedules the independent column searches.
///
/// # Errors
///
/// Fails if the images have different sizes or the patch size is invalid.
pub fn compute_disparity<K, P>(
    left: &Image<u8, 3>,
    right: &Image<u8, 3>,
    disparity_bias: f64,
    patch_size: usize,
    kernel: &K,
    extractor: &P,
    strategy: ExecutionStrategy,
) -> Result<DisparityOutput, StereoError>
where
    K: MatchingCost + ?Sized,
    P: PatchExtractor + ?Sized,
{
    if left.size() != right.size() {
        return Err(StereoError::ImageShapeMismatch(left.size(), right.size()));
    }

    let left_patches = extractor.extract(&normalize_rgb(left)?, patch_size)?;
    let right_patches = extractor.extract(&normalize_rgb(right)?, patch_size)?;

    let (rows, cols) = (left.rows(), left.cols());

    let search = |col: usize| {
        let cost = kernel.cost_matrix(left_patches.column(col), right_patches.column(col));
        match_column(cost, rows, disparity_bias)
    };

    let columns = match strategy {
        ExecutionStrategy::Parallel => (0..cols).into_par_iter().map(search).collect::<Vec<_>>(),
        ExecutionStrategy::Serial => (0..cols).map(search).collect::<Vec<_>>(),
    };

    let mut disparity = Image::from_size_val(left.size(), 0.0)?;
    let mut consistency = Image::from_size_val(left.size(), 0u8)?;
    {
        let disparity = disparity.as_slice_mut();
        let consistency = consistency.as_slice_mut();
        for (col, matches) in columns.iter().enumerate() {
            for row in 0..rows {
                disparity[row * cols + col] = matches.disparity[row];
                consistency[row * cols + col] = matches.consistency[row];
            }
        }
    }

    log::debug!(
        "disparity {}: {} / {} pixels left-right consistent",
        left.size(),
        consistency.as_slice().iter().filter(|&&v| v > 0).count(),
        rows * cols
    );

    Ok(DisparityOutput {
        disparity,
        consistency,
    })
}
