use crate::parallel;
use twoview_image::{Image, ImageError};

/// Extract the HSV value channel, `max(r, g, b)`, of an 8 bit RGB image.
///
/// # Arguments
///
/// * `src` - The input RGB image.
/// * `dst` - The output value image with the same size as `src`.
///
/// # Example
///
/// ```
/// use twoview_image::Image;
/// use twoview_imgproc::color::value_from_rgb;
///
/// let image = Image::<u8, 3>::new([2, 1].into(), vec![10, 40, 20, 0, 0, 0]).unwrap();
/// let mut value = Image::<u8, 1>::from_size_val(image.size(), 0).unwrap();
///
/// value_from_rgb(&image, &mut value).unwrap();
/// assert_eq!(value.as_slice(), &[40, 0]);
/// ```
pub fn value_from_rgb(src: &Image<u8, 3>, dst: &mut Image<u8, 1>) -> Result<(), ImageError> {
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            dst.cols(),
            dst.rows(),
        ));
    }

    parallel::par_iter_rows(src, dst, |rgb, v| {
        v[0] = rgb[0].max(rgb[1]).max(rgb[2]);
    });

    Ok(())
}
