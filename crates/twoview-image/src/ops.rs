use crate::{Image, ImageError};

/// Convert a floating point image to another pixel type, rounding and
/// saturating where the target type requires it.
///
/// # Example
///
/// ```
/// use twoview_image::{ops::convert_from_f32, Image};
///
/// let image = Image::<f32, 1>::new([2, 1].into(), vec![0.4, 254.6]).unwrap();
/// let image_u8: Image<u8, 1> = convert_from_f32(&image).unwrap();
///
/// assert_eq!(image_u8.as_slice(), &[0, 255]);
/// ```
pub fn convert_from_f32<U: crate::ImageDtype, const C: usize>(
    src: &Image<f32, C>,
) -> Result<Image<U, C>, ImageError> {
    let data = src.as_slice().iter().map(|&x| U::from_f32(x)).collect();
    Image::new(src.size(), data)
}
