use std::path::{Path, PathBuf};
use std::fs;
use image::{GrayImage, ImageFormat, RgbImage};

use crate::errors::{HyphaError, Result};
use crate::raster::{BinaryRaster, Polarity};

/// Represents an input skeleton image with its metadata
pub struct InputImage {
    pub image: GrayImage,
    pub path: PathBuf,
    pub filename: String,
}

impl InputImage {
    /// Binary raster of this image under the given polarity
    pub fn to_raster(&self, polarity: Polarity) -> Result<BinaryRaster> {
        BinaryRaster::from_luma(&self.image, polarity)
    }
}

/// Get all PNG files from a directory (recursively), sorted by path
pub fn get_png_files_in_dir<P: AsRef<Path>>(dir_path: P) -> Result<Vec<PathBuf>> {
    let dir_path = dir_path.as_ref();

    if !dir_path.exists() {
        return Err(HyphaError::InvalidPath(dir_path.to_path_buf()));
    }

    if !dir_path.is_dir() {
        return Err(HyphaError::Config(format!(
            "{} is not a directory", dir_path.display()
        )));
    }

    let mut png_files = Vec::new();
    find_png_files_recursive(dir_path, &mut png_files)?;
    png_files.sort();

    Ok(png_files)
}

fn find_png_files_recursive(dir_path: &Path, result: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir_path)? {
        let path = entry?.path();

        if path.is_dir() {
            find_png_files_recursive(&path, result)?;
        } else if path.is_file() {
            let is_png = path
                .extension()
                .map_or(false, |ext| ext.to_ascii_lowercase() == "png");
            if is_png {
                result.push(path);
            }
        }
    }

    Ok(())
}

/// Load a PNG image as 8-bit greyscale
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<InputImage> {
    let path = path.as_ref();

    let filename = path.file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| HyphaError::InvalidPath(path.to_path_buf()))?
        .to_string();

    let image = image::open(path)?.to_luma8();

    Ok(InputImage {
        image,
        path: path.to_path_buf(),
        filename,
    })
}

/// Save an RGB overlay as PNG
pub fn save_image<P: AsRef<Path>>(image: &RgbImage, path: P) -> Result<()> {
    image.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}

/// Save a raster as a greyscale PNG, keeping its raw values
pub fn save_raster<P: AsRef<Path>>(raster: &BinaryRaster, path: P) -> Result<()> {
    raster.to_luma().save_with_format(path, ImageFormat::Png)?;
    Ok(())
}
