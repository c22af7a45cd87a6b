use twoview_3d::{
    linalg::{inverse33, matvec33, transform_points, Mat33},
    outlier::OutlierFilter,
};
use twoview_image::Image;
use twoview_imgproc::{
    color::value_from_rgb,
    morphology::{close, Kernel},
    threshold::threshold_binary,
};

use crate::{config::PostprocessConfig, StereoError};

/// The filtered point cloud and the masks that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct PostprocessOutput {
    /// 1 for the pixels whose point survived every filter.
    pub mask: Image<u8, 1>,
    /// The closed foreground mask.
    pub foreground: Image<u8, 1>,
    /// The depth band mask.
    pub depth_band: Image<u8, 1>,
    /// The surviving points in world coordinates.
    pub points_world: Vec<[f64; 3]>,
    /// The surviving points in the rectified camera frame.
    pub points_cam: Vec<[f64; 3]>,
    /// The color of every surviving point.
    pub colors: Vec<[u8; 3]>,
}

/// Segment the bright foreground of an RGB image.
///
/// A pixel is foreground when its HSV value, `max(r, g, b)`, is strictly
/// greater than `threshold`. The mask is then closed with an elliptical
/// element of side `close_kernel_size`.
pub fn foreground_mask(
    rgb: &Image<u8, 3>,
    threshold: f32,
    close_kernel_size: usize,
) -> Result<Image<u8, 1>, StereoError> {
    let mut value = Image::<u8, 1>::from_size_val(rgb.size(), 0)?;
    value_from_rgb(rgb, &mut value)?;

    let mut mask = Image::<u8, 1>::from_size_val(rgb.size(), 0)?;
    threshold_binary(&value.cast::<f32>()?, &mut mask, threshold, 1)?;

    let mut closed = Image::<u8, 1>::from_size_val(rgb.size(), 0)?;
    close(&mask, &mut closed, &Kernel::ellipse(close_kernel_size))?;

    Ok(closed)
}

/// Keep the pixels with `z_near < depth < z_far`.
pub fn depth_band_mask(
    depth: &Image<f64, 1>,
    z_near: f64,
    z_far: f64,
) -> Result<Image<u8, 1>, StereoError> {
    let data = depth
        .as_slice()
        .iter()
        .map(|&d| u8::from(d > z_near && d < z_far))
        .collect();
    Ok(Image::new(depth.size(), data)?)
}

fn min_in_place(dst: &mut Image<u8, 1>, other: &Image<u8, 1>) -> Result<(), StereoError> {
    if dst.size() != other.size() {
        return Err(StereoError::ImageShapeMismatch(dst.size(), other.size()));
    }
    dst.as_slice_mut()
        .iter_mut()
        .zip(other.as_slice())
        .for_each(|(a, &b)| *a = (*a).min(b));
    Ok(())
}

/// Invert the 4x4 pose `[R | t]`, returning the rotation and translation of the inverse.
fn invert_pose(r: &Mat33, t: &[f64; 3]) -> Result<(Mat33, [f64; 3]), StereoError> {
    let r_inv = inverse33(r)?;
    let t_inv = matvec33(&r_inv, t);
    Ok((r_inv, [-t_inv[0], -t_inv[1], -t_inv[2]]))
}

/// Filter the back-projected points and move the survivors to world coordinates.
///
/// A pixel survives when it is foreground, its depth is inside the band, it is
/// left-right consistent (if enabled and given) and its point is an inlier for
/// `outlier_filter` among the points that passed the previous masks.
///
/// # Arguments
///
/// * `depth` - The depth map.
/// * `rgb` - The rectified image the depth map is aligned with.
/// * `points_cam` - The back-projected point of every pixel.
/// * `c_r_w`, `c_t_w` - World to rectified camera transform.
/// * `consistency` - Optional left-right consistency mask.
/// * `config` - Filtering parameters.
/// * `outlier_filter` - Classifies the candidate points.
///
/// # Errors
///
/// Fails if the maps have different sizes or the pose is singular.
#[allow(clippy::too_many_arguments)]
pub fn postprocess<F: OutlierFilter + ?Sized>(
    depth: &Image<f64, 1>,
    rgb: &Image<u8, 3>,
    points_cam: &Image<f64, 3>,
    c_r_w: &Mat33,
    c_t_w: &[f64; 3],
    consistency: Option<&Image<u8, 1>>,
    config: &PostprocessConfig,
    outlier_filter: &F,
) -> Result<PostprocessOutput, StereoError> {
    if rgb.size() != depth.size() {
        return Err(StereoError::ImageShapeMismatch(depth.size(), rgb.size()));
    }
    if points_cam.size() != depth.size() {
        return Err(StereoError::ImageShapeMismatch(depth.size(), points_cam.size()));
    }

    let foreground = foreground_mask(rgb, config.hsv_threshold, config.close_kernel_size)?;
    let depth_band = depth_band_mask(depth, config.z_near, config.z_far)?;

    let mut mask = depth_band.clone();
    min_in_place(&mut mask, &foreground)?;
    if config.use_consistency {
        if let Some(consistency) = consistency {
            min_in_place(&mut mask, consistency)?;
        }
    }

    let xyz = points_cam.as_slice();
    let point_at = |i: usize| [xyz[3 * i], xyz[3 * i + 1], xyz[3 * i + 2]];

    let candidates = mask
        .as_slice()
        .iter()
        .enumerate()
        .filter_map(|(i, &m)| (m > 0).then_some(i))
        .collect::<Vec<_>>();
    let candidate_points = candidates.iter().map(|&i| point_at(i)).collect::<Vec<_>>();

    let inliers = outlier_filter.inliers(&candidate_points)?;

    let mask_data = mask.as_slice_mut();
    mask_data.iter_mut().for_each(|m| *m = 0);
    for &k in inliers.iter() {
        mask_data[candidates[k]] = 1;
    }

    let survivors = candidates
        .iter()
        .copied()
        .filter(|&i| mask_data[i] > 0)
        .collect::<Vec<_>>();

    let points_cam = survivors.iter().map(|&i| point_at(i)).collect::<Vec<_>>();
    let colors = survivors
        .iter()
        .map(|&i| {
            let px = &rgb.as_slice()[3 * i..3 * i + 3];
            [px[0], px[1], px[2]]
        })
        .collect::<Vec<_>>();

    let (w_r_c, w_t_c) = invert_pose(c_r_w, c_t_w)?;
    let mut points_world = vec![[0.0; 3]; points_cam.len()];
    transform_points(&points_cam, &w_r_c, &w_t_c, &mut points_world);

    log::debug!(
        "postprocess: {} candidates after masking, {} after outlier removal",
        candidates.len(),
        points_world.len()
    );
    if points_world.is_empty() {
        log::warn!("postprocess: no point survived the filters");
    }

    Ok(PostprocessOutput {
        mask,
        foreground,
        depth_band,
        points_world,
        points_cam,
        colors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use twoview_3d::{linalg::IDENTITY33, outlier::OutlierError};
    use twoview_image::ImageSize;

    /// Accepts every point.
    struct KeepAll;

    impl OutlierFilter for KeepAll {
        fn inliers(&self, points: &[[f64; 3]]) -> Result<Vec<usize>, OutlierError> {
            Ok((0..points.len()).collect())
        }
    }

    /// Rejects the first point.
    struct DropFirst;

    impl OutlierFilter for DropFirst {
        fn inliers(&self, points: &[[f64; 3]]) -> Result<Vec<usize>, OutlierError> {
            Ok((1..points.len()).collect())
        }
    }

    fn scene(size: ImageSize, depth: impl Fn(usize, usize) -> f64) -> (Image<f64, 1>, Image<f64, 3>) {
        let depth_map = Image::from_fn(size, |x, y, _| depth(x, y));
        let points = Image::from_fn(size, |x, y, c| match c {
            0 => x as f64,
            1 => y as f64,
            _ => depth(x, y),
        });
        (depth_map, points)
    }

    #[test]
    fn test_foreground_threshold_is_strict() -> Result<(), StereoError> {
        let rgb = Image::<u8, 3>::new([3, 1].into(), vec![45, 0, 0, 46, 0, 0, 10, 200, 3])?;
        let mask = foreground_mask(&rgb, 45.0, 1)?;
        assert_eq!(mask.as_slice(), &[0, 1, 1]);
        Ok(())
    }

    #[test]
    fn test_foreground_closing_fills_holes() -> Result<(), StereoError> {
        let mut rgb = Image::<u8, 3>::from_size_val([9, 9].into(), 255)?;
        for c in 0..3 {
            rgb.set_pixel(4, 4, c, 0)?;
        }
        let mask = foreground_mask(&rgb, 45.0, 3)?;
        assert!(mask.as_slice().iter().all(|&v| v == 1));
        Ok(())
    }

    #[test]
    fn test_depth_band_is_strict() -> Result<(), StereoError> {
        let depth = Image::new([5, 1].into(), vec![0.5, 0.55, 0.6, 0.1, 0.59])?;
        let mask = depth_band_mask(&depth, 0.5, 0.6)?;
        assert_eq!(mask.as_slice(), &[0, 1, 0, 0, 1]);
        Ok(())
    }

    #[test]
    fn test_masks_and_world_transform() -> Result<(), StereoError> {
        let size = ImageSize {
            width: 4,
            height: 3,
        };
        let (depth, points) = scene(size, |x, _| if x < 2 { 0.55 } else { 3.0 });
        let rgb = Image::<u8, 3>::from_size_val(size, 200)?;

        let mut consistency = Image::<u8, 1>::from_size_val(size, 1)?;
        consistency.set_pixel(0, 0, 0, 0)?;

        let config = PostprocessConfig {
            close_kernel_size: 1,
            ..Default::default()
        };

        // camera translated by +1 along x in the world frame
        let c_t_w = [-1.0, 0.0, 0.0];
        let out = postprocess(
            &depth,
            &rgb,
            &points,
            &IDENTITY33,
            &c_t_w,
            Some(&consistency),
            &config,
            &KeepAll,
        )?;

        // columns 0 and 1 are inside the band, minus the inconsistent pixel
        assert_eq!(out.points_cam.len(), 5);
        assert_eq!(out.colors, vec![[200; 3]; 5]);
        assert_eq!(*out.mask.get_pixel(0, 0, 0)?, 0);
        assert_eq!(*out.mask.get_pixel(1, 0, 0)?, 1);
        assert_eq!(*out.mask.get_pixel(2, 0, 0)?, 0);

        for (pc, pw) in out.points_cam.iter().zip(out.points_world.iter()) {
            assert_relative_eq!(pw[0], pc[0] + 1.0, epsilon = 1e-12);
            assert_relative_eq!(pw[1], pc[1], epsilon = 1e-12);
            assert_relative_eq!(pw[2], pc[2], epsilon = 1e-12);
        }
        Ok(())
    }

    #[test]
    fn test_consistency_can_be_disabled() -> Result<(), StereoError> {
        let size = ImageSize {
            width: 2,
            height: 2,
        };
        let (depth, points) = scene(size, |_, _| 0.55);
        let rgb = Image::<u8, 3>::from_size_val(size, 255)?;
        let consistency = Image::<u8, 1>::from_size_val(size, 0)?;

        let config = PostprocessConfig {
            use_consistency: false,
            ..Default::default()
        };
        let out = postprocess(
            &depth,
            &rgb,
            &points,
            &IDENTITY33,
            &[0.0; 3],
            Some(&consistency),
            &config,
            &KeepAll,
        )?;
        assert_eq!(out.points_world.len(), 4);
        Ok(())
    }

    #[test]
    fn test_outlier_mask_is_applied() -> Result<(), StereoError> {
        let size = ImageSize {
            width: 3,
            height: 1,
        };
        let (depth, points) = scene(size, |_, _| 0.55);
        let rgb = Image::<u8, 3>::from_size_val(size, 255)?;

        let out = postprocess(
            &depth,
            &rgb,
            &points,
            &IDENTITY33,
            &[0.0; 3],
            None,
            &PostprocessConfig::default(),
            &DropFirst,
        )?;
        assert_eq!(out.mask.as_slice(), &[0, 1, 1]);
        assert_eq!(out.points_cam, vec![[1.0, 0.0, 0.55], [2.0, 0.0, 0.55]]);
        Ok(())
    }

    #[test]
    fn test_nothing_survives() -> Result<(), StereoError> {
        let size = ImageSize {
            width: 3,
            height: 2,
        };
        let (depth, points) = scene(size, |_, _| 10.0);
        let rgb = Image::<u8, 3>::from_size_val(size, 255)?;
        let out = postprocess(
            &depth,
            &rgb,
            &points,
            &IDENTITY33,
            &[0.0; 3],
            None,
            &PostprocessConfig::default(),
            &KeepAll,
        )?;
        assert!(out.points_world.is_empty());
        assert!(out.colors.is_empty());
        assert!(out.mask.as_slice().iter().all(|&v| v == 0));
        Ok(())
    }
}
