use serde::{Deserialize, Serialize};

use crate::{patch::PatchBatch, EPS};

/// Scores every pair of patches of two batches, lower is better.
pub trait MatchingCost: Send + Sync {
    /// Compute the `M x N` row-major cost matrix between `src` (M patches) and `dst` (N patches).
    ///
    /// PRECONDITION: both batches have the same patch length.
    fn cost_matrix(&self, src: PatchBatch<'_>, dst: PatchBatch<'_>) -> Vec<f64>;
}

/// Sum of squared differences over all patch values.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ssd;

/// Sum of absolute differences over all patch values.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sad;

/// Negated zero-mean normalized cross correlation, summed over the color channels.
///
/// Each channel of a patch is centered on its mean and the correlation is
/// normalized by the product of the channel standard deviations plus [`EPS`],
/// so flat patches score zero instead of producing NaN.
#[derive(Debug, Clone, Copy, Default)]
pub struct NegativeZncc;

fn pairwise(src: PatchBatch<'_>, dst: PatchBatch<'_>, f: impl Fn(&[f64], &[f64]) -> f64) -> Vec<f64> {
    let mut out = Vec::with_capacity(src.len() * dst.len());
    for a in src.iter() {
        out.extend(dst.iter().map(|b| f(a, b)));
    }
    out
}

impl MatchingCost for Ssd {
    fn cost_matrix(&self, src: PatchBatch<'_>, dst: PatchBatch<'_>) -> Vec<f64> {
        pairwise(src, dst, |a, b| {
            a.iter()
                .zip(b.iter())
                .map(|(x, y)| (x - y) * (x - y))
                .sum()
        })
    }
}

impl MatchingCost for Sad {
    fn cost_matrix(&self, src: PatchBatch<'_>, dst: PatchBatch<'_>) -> Vec<f64> {
        pairwise(src, dst, |a, b| {
            a.iter().zip(b.iter()).map(|(x, y)| (x - y).abs()).sum()
        })
    }
}

/// Patches centered per channel, one `patches x area` row-major plane per channel.
struct CenteredPatches {
    planes: [Vec<f64>; 3],
    std: Vec<[f64; 3]>,
    area: usize,
}

impl CenteredPatches {
    fn new(batch: PatchBatch<'_>) -> Self {
        let area = batch.patch_len() / 3;
        let mut planes = [(); 3].map(|_| Vec::with_capacity(batch.len() * area));
        let mut std = Vec::with_capacity(batch.len());

        for patch in batch.iter() {
            let mut mean = [0.0; 3];
            for px in patch.chunks_exact(3) {
                for c in 0..3 {
                    mean[c] += px[c];
                }
            }
            mean.iter_mut().for_each(|m| *m /= area as f64);

            let mut var = [0.0; 3];
            for px in patch.chunks_exact(3) {
                for c in 0..3 {
                    let v = px[c] - mean[c];
                    var[c] += v * v;
                    planes[c].push(v);
                }
            }
            std.push(var.map(|v| (v / area as f64).sqrt()));
        }

        Self { planes, std, area }
    }

    fn len(&self) -> usize {
        self.std.len()
    }
}

impl MatchingCost for NegativeZncc {
    fn cost_matrix(&self, src: PatchBatch<'_>, dst: PatchBatch<'_>) -> Vec<f64> {
        let src = CenteredPatches::new(src);
        let dst = CenteredPatches::new(dst);

        let (m, n) = (src.len(), dst.len());
        if m == 0 || n == 0 {
            return Vec::new();
        }

        let mut out = vec![0.0; m * n];
        let mut corr = vec![0.0; m * n];

        for c in 0..3 {
            let src_plane = faer::mat::from_row_major_slice(src.planes[c].as_slice(), m, src.area);
            let dst_plane = faer::mat::from_row_major_slice(dst.planes[c].as_slice(), n, dst.area);

            // a column-major n x m matrix shares the layout of the row-major m x n output
            {
                let mut corr_mat = faer::mat::from_column_major_slice_mut(corr.as_mut_slice(), n, m);
                faer::linalg::matmul::matmul(
                    &mut corr_mat,
                    dst_plane,
                    src_plane.transpose(),
                    None,
                    1.0,
                    faer::Parallelism::None,
                );
            }

            for (row, (out_row, corr_row)) in out
                .chunks_exact_mut(n)
                .zip(corr.chunks_exact(n))
                .enumerate()
            {
                let src_std = src.std[row][c];
                for ((o, &x), dst_std) in out_row.iter_mut().zip(corr_row).zip(&dst.std) {
                    *o -= x / (src_std * dst_std[c] + EPS);
                }
            }
        }

        out
    }
}

/// Selects one of the built-in matching costs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchingKernel {
    /// Sum of squared differences.
    #[default]
    Ssd,
    /// Sum of absolute differences.
    Sad,
    /// Negated zero-mean normalized cross correlation.
    Zncc,
}

impl MatchingCost for MatchingKernel {
    fn cost_matrix(&self, src: PatchBatch<'_>, dst: PatchBatch<'_>) -> Vec<f64> {
        match self {
            MatchingKernel::Ssd => Ssd.cost_matrix(src, dst),
            MatchingKernel::Sad => Sad.cost_matrix(src, dst),
            MatchingKernel::Zncc => NegativeZncc.cost_matrix(src, dst),
        }
    }
}

impl std::fmt::Display for MatchingKernel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            MatchingKernel::Ssd => "ssd",
            MatchingKernel::Sad => "sad",
            MatchingKernel::Zncc => "zncc",
        };
        write!(f, "{name}")
    }
}

impl std::str::FromStr for MatchingKernel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ssd" => Ok(MatchingKernel::Ssd),
            "sad" => Ok(MatchingKernel::Sad),
            "zncc" => Ok(MatchingKernel::Zncc),
            other => Err(format!("unknown matching kernel: {other}, expected ssd, sad or zncc")),
        }
    }
}
