use rayon::prelude::*;

use super::Kernel;
use twoview_image::{Image, ImageError};

fn morph_reduce<T, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<T, C>,
    kernel: &Kernel,
    reduce: impl Fn(T, T) -> T + Send + Sync,
) -> Result<(), ImageError>
where
    T: Copy + Send + Sync,
{
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            dst.width(),
            dst.height(),
            src.width(),
            src.height(),
        ));
    }

    if src.width() == 0 || src.height() == 0 {
        return Ok(());
    }

    let (width, height) = (src.width() as isize, src.height() as isize);
    let offsets = kernel.offsets();
    let src_data = src.as_slice();

    // pixels outside the image never take part in the reduction
    dst.as_slice_mut()
        .par_chunks_exact_mut(width as usize * C)
        .enumerate()
        .for_each(|(y, row_chunk)| {
            let y = y as isize;
            for x in 0..width {
                for c in 0..C {
                    let idx = (y * width + x) as usize * C + c;
                    let mut acc = src_data[idx];
                    for &(dy, dx) in offsets.iter() {
                        let (py, px) = (y + dy, x + dx);
                        if py < 0 || py >= height || px < 0 || px >= width {
                            continue;
                        }
                        acc = reduce(acc, src_data[(py * width + px) as usize * C + c]);
                    }
                    row_chunk[x as usize * C + c] = acc;
                }
            }
        });

    Ok(())
}

/// Dilate an image using a [`Kernel`].
///
/// Each pixel is replaced by the maximum value in the neighborhood defined
/// by the kernel. The anchor pixel always takes part in the neighborhood.
pub fn dilate<T, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<T, C>,
    kernel: &Kernel,
) -> Result<(), ImageError>
where
    T: Copy + Send + Sync + Ord,
{
    morph_reduce(src, dst, kernel, |a, b| a.max(b))
}

/// Erode an image using a [`Kernel`].
///
/// Each pixel is replaced by the minimum value in the neighborhood defined
/// by the kernel. The anchor pixel always takes part in the neighborhood.
pub fn erode<T, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<T, C>,
    kernel: &Kernel,
) -> Result<(), ImageError>
where
    T: Copy + Send + Sync + Ord,
{
    morph_reduce(src, dst, kernel, |a, b| a.min(b))
}

/// Morphological closing: a dilation followed by an erosion.
///
/// Fills holes and gaps smaller than the structuring element.
///
/// # Example
///
/// ```
/// use twoview_image::Image;
/// use twoview_imgproc::morphology::{close, Kernel};
///
/// let mut src = Image::<u8, 1>::from_size_val([5, 5].into(), 255).unwrap();
/// src.set_pixel(2, 2, 0, 0).unwrap();
///
/// let mut dst = Image::<u8, 1>::from_size_val(src.size(), 0).unwrap();
/// close(&src, &mut dst, &Kernel::ellipse(3)).unwrap();
///
/// assert!(dst.as_slice().iter().all(|&v| v == 255));
/// ```
pub fn close<T, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<T, C>,
    kernel: &Kernel,
) -> Result<(), ImageError>
where
    T: Copy + Send + Sync + Ord,
{
    let mut dilated = src.clone();
    dilate(src, &mut dilated, kernel)?;
    erode(&dilated, dst, kernel)
}
