use num_traits::Zero;

use twoview_image::{Image, ImageError};

use crate::parallel;

/// Apply a binary threshold to an image.
///
/// Values strictly greater than `threshold` are set to `max_value`, all others to zero.
///
/// # Arguments
///
/// * `src` - The input image of an arbitrary number of channels and type.
/// * `dst` - The output image with the same size and channels as the input.
/// * `threshold` - The threshold value.
/// * `max_value` - The value written where the input is above the threshold.
///
/// # Examples
///
/// ```
/// use twoview_image::{Image, ImageSize};
/// use twoview_imgproc::threshold::threshold_binary;
///
/// let data = vec![100.0f32, 200.0, 50.0, 150.0, 200.0, 250.0];
/// let image = Image::<_, 1>::new(ImageSize { width: 2, height: 3 }, data).unwrap();
///
/// let mut thresholded = Image::<u8, 1>::from_size_val(image.size(), 0).unwrap();
///
/// threshold_binary(&image, &mut thresholded, 100.0, 255).unwrap();
/// assert_eq!(thresholded.as_slice(), &[0, 255, 0, 255, 255, 255]);
/// ```
pub fn threshold_binary<T, U, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<U, C>,
    threshold: T,
    max_value: U,
) -> Result<(), ImageError>
where
    T: Copy + Send + Sync + PartialOrd,
    U: Copy + Send + Sync + Zero,
{
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            dst.cols(),
            dst.rows(),
        ));
    }

    parallel::par_iter_rows_val(src, dst, |src_pixel, dst_pixel| {
        *dst_pixel = if *src_pixel > threshold {
            max_value
        } else {
            U::zero()
        };
    });

    Ok(())
}
