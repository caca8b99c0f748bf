use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat};
use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

lazy_static! {
    static ref UNSAFE_FILENAME_CHARS: Regex = Regex::new(r#"[<>:"/\\|?*]"#).unwrap();
}

/// Why a single cover fetch ended without an image.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Image request failed with status: {0}")]
    Status(u16),

    #[error("Decode error: {0}")]
    Decode(String),
}

impl FetchError {
    pub fn is_network(&self) -> bool {
        !matches!(self, FetchError::Decode(_))
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            FetchError::Timeout
        } else if let Some(status) = error.status() {
            FetchError::Status(status.as_u16())
        } else {
            FetchError::Network(error.to_string())
        }
    }
}

/// Why an image source could not be set up.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Failed to create proxy: {0}")]
    Proxy(#[source] reqwest::Error),

    #[error("Failed to build client: {0}")]
    Build(#[source] reqwest::Error),
}

#[derive(Error, Debug)]
pub enum SaveError {
    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to write cover: {0}")]
    Encode(#[from] image::ImageError),
}

/// Shared handle to a decoded bitmap. Cloning never copies pixels.
#[derive(Clone)]
pub struct DecodedImage(Arc<DynamicImage>);

impl DecodedImage {
    pub fn new(image: DynamicImage) -> Self {
        Self(Arc::new(image))
    }

    pub fn width(&self) -> u32 {
        self.0.width()
    }

    pub fn height(&self) -> u32 {
        self.0.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.0.dimensions()
    }

    pub fn as_image(&self) -> &DynamicImage {
        &self.0
    }

    /// True when both handles point at the same decoded bitmap.
    pub fn same_as(&self, other: &DecodedImage) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    #[cfg(test)]
    pub(crate) fn solid(width: u32, height: u32, shade: u8) -> Self {
        let pixels = image::RgbaImage::from_pixel(width, height, image::Rgba([shade, shade, shade, 255]));
        Self::new(DynamicImage::ImageRgba8(pixels))
    }
}

impl fmt::Debug for DecodedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (width, height) = self.dimensions();
        write!(f, "DecodedImage({}x{})", width, height)
    }
}

// Decode fetched bytes, shrinking to fit `max_dimension` when set
pub fn decode_image(data: &[u8], max_dimension: Option<u32>) -> Result<DecodedImage, FetchError> {
    let img = image::load_from_memory(data)
        .map_err(|e| FetchError::Decode(format!("Failed to load image: {}", e)))?;

    let img = match max_dimension {
        Some(max) => fit_within(img, max),
        None => img,
    };

    Ok(DecodedImage::new(img))
}

fn fit_within(img: DynamicImage, max: u32) -> DynamicImage {
    let (width, height) = img.dimensions();
    if max == 0 || (width <= max && height <= max) {
        return img;
    }
    // Keeps aspect ratio
    img.resize(max, max, FilterType::Triangle)
}

/// Strip characters that are not allowed in file names on common platforms.
pub fn safe_file_stem(title: &str) -> String {
    let stem = UNSAFE_FILENAME_CHARS.replace_all(title, "").trim().to_string();
    if stem.is_empty() {
        "untitled".to_string()
    } else {
        stem
    }
}

/// Write a decoded cover as `{title}_cover.png` inside `dir`.
pub fn save_cover(image: &DecodedImage, title: &str, dir: &Path) -> Result<PathBuf, SaveError> {
    std::fs::create_dir_all(dir).map_err(|source| SaveError::CreateDir {
        path: dir.display().to_string(),
        source,
    })?;

    let path = dir.join(format!("{}_cover.png", safe_file_stem(title)));
    image.as_image().save_with_format(&path, ImageFormat::Png)?;
    log::info!("Cover saved: {}", path.display());
    Ok(path)
}

#[cfg(test)]
pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut output = Vec::new();
    DecodedImage::solid(width, height, 120)
        .as_image()
        .write_to(&mut std::io::Cursor::new(&mut output), ImageFormat::Png)
        .unwrap();
    output
}
