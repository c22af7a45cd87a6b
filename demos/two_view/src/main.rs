use std::path::{Path, PathBuf};

use argh::FromArgs;
use serde::Deserialize;
use twoview::{
    image::Image,
    k3d::{io::ply::write_ply_ascii, linalg::Mat33},
    stereo::{
        disparity::ExecutionStrategy, kernels::MatchingKernel, two_view, StereoConfig, View,
    },
};

/// Reconstruct a point cloud from two calibrated views
#[derive(FromArgs)]
struct Args {
    /// path to the JSON calibration file
    #[argh(positional)]
    calibration: PathBuf,

    /// index of the first (left) view in the calibration file
    #[argh(option, short = 'i', default = "0")]
    view_i: usize,

    /// index of the second (right) view in the calibration file
    #[argh(option, short = 'j', default = "1")]
    view_j: usize,

    /// optional JSON file with the pipeline configuration
    #[argh(option, short = 'c')]
    config: Option<PathBuf>,

    /// matching kernel: ssd, sad or zncc
    #[argh(option, short = 'k')]
    kernel: Option<MatchingKernel>,

    /// side of the matching window, odd
    #[argh(option, short = 'p')]
    patch_size: Option<usize>,

    /// nearest accepted depth
    #[argh(option)]
    z_near: Option<f64>,

    /// farthest accepted depth
    #[argh(option)]
    z_far: Option<f64>,

    /// pixels cropped on each side of the rectified images
    #[argh(option)]
    padding: Option<usize>,

    /// neighbors used by the statistical outlier removal
    #[argh(option)]
    nb_neighbors: Option<usize>,

    /// standard deviation multiplier of the outlier threshold
    #[argh(option)]
    std_ratio: Option<f64>,

    /// keep only left-right consistent matches
    #[argh(switch)]
    consistency: bool,

    /// search the disparity columns on a single thread
    #[argh(switch)]
    serial: bool,

    /// output PLY file
    #[argh(option, short = 'o', default = "PathBuf::from(\"two_view.ply\")")]
    output: PathBuf,

    /// directory to write the debug masks to
    #[argh(option)]
    debug_dir: Option<PathBuf>,
}

/// One calibrated camera of the calibration file.
#[derive(Deserialize)]
struct CameraEntry {
    /// image path, relative to the calibration file
    image: PathBuf,
    #[serde(rename = "K")]
    k: Mat33,
    #[serde(rename = "R")]
    r: Mat33,
    #[serde(rename = "T")]
    t: [f64; 3],
}

fn read_image_rgb8(path: &Path) -> Result<Image<u8, 3>, Box<dyn std::error::Error>> {
    let img = image::open(path)?.to_rgb8();
    let size = [img.width() as usize, img.height() as usize].into();
    Ok(Image::new(size, img.into_raw())?)
}

fn load_view(entry: &CameraEntry, root: &Path) -> Result<View, Box<dyn std::error::Error>> {
    let rgb = read_image_rgb8(&root.join(&entry.image))?;
    Ok(View::new(rgb, entry.k, entry.r, entry.t))
}

fn write_mask(mask: &Image<u8, 1>, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let data = mask.as_slice().iter().map(|&v| v.saturating_mul(255)).collect();
    let img = image::GrayImage::from_raw(mask.width() as u32, mask.height() as u32, data)
        .ok_or("mask buffer does not match its size")?;
    img.save(path)?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    let mut config = match &args.config {
        Some(path) => serde_json::from_str::<StereoConfig>(&std::fs::read_to_string(path)?)?,
        None => StereoConfig::default(),
    };
    if let Some(kernel) = args.kernel {
        config = config.with_kernel(kernel);
    }
    if let Some(patch_size) = args.patch_size {
        config = config.with_patch_size(patch_size);
    }
    if let Some(padding) = args.padding {
        config = config.with_padding(padding, padding);
    }
    config = config
        .with_depth_range(
            args.z_near.unwrap_or(config.postprocess.z_near),
            args.z_far.unwrap_or(config.postprocess.z_far),
        )
        .with_outlier(
            args.nb_neighbors
                .unwrap_or(config.postprocess.outlier.nb_neighbors),
            args.std_ratio.unwrap_or(config.postprocess.outlier.std_ratio),
        );
    if args.consistency {
        config = config.with_consistency(true);
    }
    if args.serial {
        config = config.with_strategy(ExecutionStrategy::Serial);
    }

    let cameras: Vec<CameraEntry> =
        serde_json::from_str(&std::fs::read_to_string(&args.calibration)?)?;
    let root = args.calibration.parent().unwrap_or(Path::new("."));

    let entry_i = cameras
        .get(args.view_i)
        .ok_or_else(|| format!("view {} not in calibration file", args.view_i))?;
    let entry_j = cameras
        .get(args.view_j)
        .ok_or_else(|| format!("view {} not in calibration file", args.view_j))?;

    let view_i = load_view(entry_i, root)?;
    let view_j = load_view(entry_j, root)?;

    for (name, view) in [("view_i", &view_i), ("view_j", &view_j)] {
        log::info!("{name}: camera center {:?}", view.camera_center());
    }

    log::info!(
        "running {} with patch size {} on {}x{} images",
        config.kernel,
        config.patch_size,
        view_i.rgb.width(),
        view_i.rgb.height()
    );

    let now = std::time::Instant::now();
    let output = two_view(&view_i, &view_j, &config)?;
    log::info!("two view reconstruction took {:?}", now.elapsed());

    write_ply_ascii(&args.output, &output.to_pointcloud())?;
    println!(
        "wrote {} points to {}",
        output.points_world().len(),
        args.output.display()
    );

    if let Some(dir) = &args.debug_dir {
        std::fs::create_dir_all(dir)?;
        write_mask(&output.filtered.foreground, &dir.join("foreground_mask.png"))?;
        write_mask(&output.filtered.depth_band, &dir.join("depth_mask.png"))?;
        write_mask(&output.consistency, &dir.join("consistency_mask.png"))?;
        write_mask(&output.filtered.mask, &dir.join("final_mask.png"))?;
    }

    Ok(())
}
