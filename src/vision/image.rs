//! Image references and loading.
//!
//! The format is sniffed from magic bytes only; pixels are never decoded
//! here. Anything that is missing, empty or not a known raster format is
//! rejected with [`CoreError::UnreadableImage`] before a backend is called.

use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::error::CoreError;

/// Where an image comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageRef {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

impl From<&Path> for ImageRef {
    fn from(p: &Path) -> Self {
        ImageRef::Path(p.to_path_buf())
    }
}

impl From<PathBuf> for ImageRef {
    fn from(p: PathBuf) -> Self {
        ImageRef::Path(p)
    }
}

impl From<Vec<u8>> for ImageRef {
    fn from(bytes: Vec<u8>) -> Self {
        ImageRef::Bytes(bytes)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
    Bmp,
    Tiff,
    Webp,
}

/// Identify a raster format from its leading bytes.
pub fn sniff_format(bytes: &[u8]) -> Option<ImageFormat> {
    if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some(ImageFormat::Png)
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some(ImageFormat::Jpeg)
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        Some(ImageFormat::Gif)
    } else if bytes.starts_with(b"BM") && bytes.len() > 14 {
        Some(ImageFormat::Bmp)
    } else if bytes.starts_with(b"II*\0") || bytes.starts_with(b"MM\0*") {
        Some(ImageFormat::Tiff)
    } else if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some(ImageFormat::Webp)
    } else {
        None
    }
}

/// Image bytes that passed the format check.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
}

impl LoadedImage {
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }
}

/// Read and check an image.
pub async fn load(image: &ImageRef) -> Result<LoadedImage, CoreError> {
    let (bytes, origin) = match image {
        ImageRef::Path(path) => {
            let bytes = tokio::fs::read(path).await.map_err(|e| {
                CoreError::UnreadableImage(format!("cannot read {}: {e}", path.display()))
            })?;
            (bytes, path.display().to_string())
        }
        ImageRef::Bytes(bytes) => (bytes.clone(), "<in-memory image>".to_string()),
    };

    if bytes.is_empty() {
        return Err(CoreError::UnreadableImage(format!("{origin} is empty")));
    }
    let format = sniff_format(&bytes)
        .ok_or_else(|| CoreError::UnreadableImage(format!("{origin} is not a supported image format")))?;

    Ok(LoadedImage { bytes, format })
}
