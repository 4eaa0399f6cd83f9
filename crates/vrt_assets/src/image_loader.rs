//! Image data container for texture pixels
//!
//! Decodes fetched bytes into RGBA8 via the `image` crate and provides
//! procedural constructors for fixed built-in images (environment map face,
//! test fills). GPU upload is the host renderer's job.

use std::path::Path;

use crate::error::AssetError;

/// Decoded RGBA8 image, ready to hand to the host texture system
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    /// Tightly packed RGBA8 pixel data, row-major
    pub pixels: Vec<u8>,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl ImageData {
    /// Decode an image from in-memory bytes (PNG, JPEG)
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AssetError> {
        let img = image::load_from_memory(bytes)
            .map_err(|e| AssetError::ImageDecode(e.to_string()))?;
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();

        log::debug!("Decoded {}x{} image from {} bytes", width, height, bytes.len());

        Ok(Self {
            pixels: rgba.into_raw(),
            width,
            height,
        })
    }

    /// Decode an image from a file on disk
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, AssetError> {
        let bytes = std::fs::read(path.as_ref())?;
        let image = Self::from_bytes(&bytes)?;
        log::debug!("Loaded image {:?} ({}x{})", path.as_ref(), image.width, image.height);
        Ok(image)
    }

    /// Create a single-color image
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let mut pixels = Vec::with_capacity((width * height * 4) as usize);
        for _ in 0..width * height {
            pixels.extend_from_slice(&rgba);
        }
        Self { pixels, width, height }
    }

    /// Create a vertical gradient between two colors
    ///
    /// Used for the built-in reflection environment face.
    pub fn vertical_gradient(width: u32, height: u32, top: [u8; 4], bottom: [u8; 4]) -> Self {
        let mut pixels = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            let t = if height > 1 {
                f64::from(y) / f64::from(height - 1)
            } else {
                0.0
            };
            let mut row_color = [0u8; 4];
            for (c, channel) in row_color.iter_mut().enumerate() {
                let blended = f64::from(top[c]).mul_add(1.0 - t, f64::from(bottom[c]) * t);
                *channel = blended.round() as u8;
            }
            for _ in 0..width {
                pixels.extend_from_slice(&row_color);
            }
        }
        Self { pixels, width, height }
    }

    /// Size of the pixel data in bytes
    pub fn size_bytes(&self) -> usize {
        self.pixels.len()
    }
}
