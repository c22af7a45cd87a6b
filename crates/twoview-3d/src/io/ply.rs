use std::io::{BufWriter, Write};
use std::path::Path;

use crate::pointcloud::PointCloud;

/// Error types for the PLY module.
#[derive(Debug, thiserror::Error)]
pub enum PlyError {
    /// Failed to write PLY file
    #[error("Failed to write PLY file")]
    Io(#[from] std::io::Error),

    /// Invalid PLY file extension
    #[error("Invalid PLY file extension. Got:{0}")]
    InvalidFileExtension(String),
}

/// Write a point cloud as an ASCII PLY file.
///
/// Each vertex holds `x y z` as doubles and, when the cloud has colors,
/// `red green blue` as unsigned chars.
///
/// # Arguments
///
/// * `path` - The output path, must have the `ply` extension.
/// * `pointcloud` - The point cloud to write.
pub fn write_ply_ascii(path: impl AsRef<Path>, pointcloud: &PointCloud) -> Result<(), PlyError> {
    let path = path.as_ref();
    match path.extension().and_then(|e| e.to_str()) {
        Some("ply") => {}
        other => {
            return Err(PlyError::InvalidFileExtension(
                other.unwrap_or_default().to_string(),
            ))
        }
    }

    let file = std::fs::File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_ply_ascii_to(&mut writer, pointcloud)?;
    writer.flush()?;

    Ok(())
}

fn write_ply_ascii_to<W: Write>(writer: &mut W, pointcloud: &PointCloud) -> Result<(), PlyError> {
    writeln!(writer, "ply")?;
    writeln!(writer, "format ascii 1.0")?;
    writeln!(writer, "element vertex {}", pointcloud.len())?;
    writeln!(writer, "property double x")?;
    writeln!(writer, "property double y")?;
    writeln!(writer, "property double z")?;
    if pointcloud.colors().is_some() {
        writeln!(writer, "property uchar red")?;
        writeln!(writer, "property uchar green")?;
        writeln!(writer, "property uchar blue")?;
    }
    writeln!(writer, "end_header")?;

    match pointcloud.colors() {
        Some(colors) => {
            for (p, c) in pointcloud.points().iter().zip(colors.iter()) {
                writeln!(
                    writer,
                    "{} {} {} {} {} {}",
                    p[0], p[1], p[2], c[0], c[1], c[2]
                )?;
            }
        }
        None => {
            for p in pointcloud.points() {
                writeln!(writer, "{} {} {}", p[0], p[1], p[2])?;
            }
        }
    }

    Ok(())
}
