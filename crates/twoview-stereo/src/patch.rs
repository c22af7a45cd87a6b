use twoview_image::Image;

use crate::StereoError;

/// Dense buffer holding the `k x k` neighborhood of every pixel of an RGB image.
///
/// Patches are stored column by column so that all the patches of one image
/// column are contiguous: the buffer has the layout `[cols][rows][k * k][3]`.
/// A single patch stores its pixels row-major with the three channels
/// interleaved.
#[derive(Debug, Clone, PartialEq)]
pub struct PatchBuffer {
    rows: usize,
    cols: usize,
    patch_size: usize,
    data: Vec<f64>,
}

/// A borrowed batch of patches of the same size.
#[derive(Debug, Clone, Copy)]
pub struct PatchBatch<'a> {
    data: &'a [f64],
    patch_len: usize,
}

impl<'a> PatchBatch<'a> {
    /// Create a batch from a flat slice of patches of `patch_len` values each.
    ///
    /// PRECONDITION: `data.len()` is a multiple of `patch_len` and `patch_len > 0`.
    pub fn new(data: &'a [f64], patch_len: usize) -> Self {
        Self { data, patch_len }
    }

    /// Number of patches in the batch.
    pub fn len(&self) -> usize {
        self.data.len() / self.patch_len
    }

    /// Whether the batch has no patches.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of values in each patch, `k * k * 3`.
    pub fn patch_len(&self) -> usize {
        self.patch_len
    }

    /// Iterate over the patches.
    pub fn iter(&self) -> std::slice::ChunksExact<'a, f64> {
        self.data.chunks_exact(self.patch_len)
    }
}

impl PatchBuffer {
    /// Number of image rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of image columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Side of the square patch.
    pub fn patch_size(&self) -> usize {
        self.patch_size
    }

    /// Number of values in each patch, `k * k * 3`.
    pub fn patch_len(&self) -> usize {
        self.patch_size * self.patch_size * 3
    }

    /// The patch centered at `(row, col)`.
    ///
    /// PRECONDITION: `row < rows` and `col < cols`.
    pub fn patch(&self, row: usize, col: usize) -> &[f64] {
        let len = self.patch_len();
        let start = (col * self.rows + row) * len;
        &self.data[start..start + len]
    }

    /// All the patches of an image column, top to bottom.
    ///
    /// PRECONDITION: `col < cols`.
    pub fn column(&self, col: usize) -> PatchBatch<'_> {
        let len = self.patch_len() * self.rows;
        PatchBatch::new(&self.data[col * len..(col + 1) * len], self.patch_len())
    }
}

/// Builds the patch buffer of an image.
pub trait PatchExtractor {
    /// Extract the `patch_size x patch_size` neighborhood of every pixel.
    ///
    /// # Errors
    ///
    /// Returns [`StereoError::InvalidPatchSize`] if `patch_size` is even or zero.
    fn extract(&self, image: &Image<f64, 3>, patch_size: usize) -> Result<PatchBuffer, StereoError>;
}

/// Patch extraction reading zeros outside the image.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZeroPaddedPatches;

impl PatchExtractor for ZeroPaddedPatches {
    fn extract(&self, image: &Image<f64, 3>, patch_size: usize) -> Result<PatchBuffer, StereoError> {
        if patch_size == 0 || patch_size % 2 == 0 {
            return Err(StereoError::InvalidPatchSize(patch_size));
        }

        let (rows, cols) = (image.rows(), image.cols());
        let half = (patch_size / 2) as isize;
        let src = image.as_slice();

        let mut data = Vec::with_capacity(rows * cols * patch_size * patch_size * 3);
        for col in 0..cols {
            for row in 0..rows {
                for dy in -half..=half {
                    let y = row as isize + dy;
                    for dx in -half..=half {
                        let x = col as isize + dx;
                        if y < 0 || x < 0 || y >= rows as isize || x >= cols as isize {
                            data.extend_from_slice(&[0.0; 3]);
                        } else {
                            let idx = (y as usize * cols + x as usize) * 3;
                            data.extend_from_slice(&src[idx..idx + 3]);
                        }
                    }
                }
            }
        }

        Ok(PatchBuffer {
            rows,
            cols,
            patch_size,
            data,
        })
    }
}

/// Convert an 8 bit RGB image to floating point in the range [0, 1].
pub fn normalize_rgb(image: &Image<u8, 3>) -> Result<Image<f64, 3>, StereoError> {
    let mut out = image.cast::<f64>()?;
    out.as_slice_mut().iter_mut().for_each(|v| *v /= 255.0);
    Ok(out)
}
