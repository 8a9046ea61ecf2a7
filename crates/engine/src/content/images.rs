use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use image::ImageReader;
use thiserror::Error;

/// Pixels of exactly this color become fully transparent on load.
pub const COLOR_KEY: [u8; 3] = [0, 0, 0];

/// Decoded RGBA8 image, row-major, no padding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sprite {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

impl Sprite {
    /// Returns `None` when `rgba` does not hold exactly `width * height` pixels.
    pub fn from_rgba(width: u32, height: u32, rgba: Vec<u8>) -> Option<Self> {
        if rgba.len() != width as usize * height as usize * 4 {
            return None;
        }
        Some(Self {
            width,
            height,
            rgba,
        })
    }

    pub fn solid(width: u32, height: u32, color: [u8; 4]) -> Self {
        let rgba = color
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();
        Self {
            width,
            height,
            rgba,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn rgba(&self) -> &[u8] {
        &self.rgba
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        let mut out = [0u8; 4];
        out.copy_from_slice(&self.rgba[offset..offset + 4]);
        Some(out)
    }

    fn apply_color_key(&mut self) {
        for pixel in self.rgba.chunks_exact_mut(4) {
            if pixel[..3] == COLOR_KEY {
                pixel[3] = 0;
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum ImageLoadError {
    #[error("failed to open image {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to decode image {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("failed to list image directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("image directory {path} contains no .png files")]
    EmptyDirectory { path: PathBuf },
}

pub fn load_image(path: &Path) -> Result<Sprite, ImageLoadError> {
    let reader = ImageReader::open(path).map_err(|source| ImageLoadError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let decoded = reader.decode().map_err(|source| ImageLoadError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    let image = decoded.to_rgba8();
    let mut sprite = Sprite {
        width: image.width(),
        height: image.height(),
        rgba: image.into_raw(),
    };
    sprite.apply_color_key();
    Ok(sprite)
}

/// Loads every `.png` in `dir`, ordered by file name.
pub fn load_images(dir: &Path) -> Result<Vec<Sprite>, ImageLoadError> {
    let read_dir_error = |source| ImageLoadError::ReadDir {
        path: dir.to_path_buf(),
        source,
    };
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_dir_error)? {
        let path = entry.map_err(read_dir_error)?.path();
        let is_png = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("png"));
        if path.is_file() && is_png {
            paths.push(path);
        }
    }
    if paths.is_empty() {
        return Err(ImageLoadError::EmptyDirectory {
            path: dir.to_path_buf(),
        });
    }
    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    paths.iter().map(|path| load_image(path)).collect()
}
