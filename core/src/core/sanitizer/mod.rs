//! Image metadata stripping and downsizing.

use crate::types::ImageBounds;
use error::SanitizeError;
use fast_image_resize::{FilterType, ResizeAlg, ResizeOptions, Resizer};
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;

pub mod error {
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum SanitizeError {
        #[error("Unsupported extension: {0}")]
        UnsupportedExtension(String),

        #[error("Image error: {0}")]
        Image(#[from] image::ImageError),

        #[error("Resize error: {0}")]
        Resize(#[from] fast_image_resize::ResizeError),
    }
}

/// Re-encodes PNG and JPEG images from raw pixels only.
///
/// Nothing but pixel data is carried into the output, which is how EXIF, ICC
/// profiles and text chunks are dropped. Images whose longer side exceeds the
/// longer side of the bounds are scaled down to fit inside the bounds.
#[derive(Debug, Clone, Copy)]
pub struct Sanitizer {
    bounds: ImageBounds,
}

impl Sanitizer {
    pub const SUPPORTED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

    pub fn new(bounds: ImageBounds) -> Self {
        Self { bounds }
    }

    pub fn bounds(&self) -> ImageBounds {
        self.bounds
    }

    pub fn is_supported(extension: &str) -> bool {
        Self::SUPPORTED_EXTENSIONS.contains(&extension.to_ascii_lowercase().as_str())
    }

    pub fn sanitize(&self, bytes: &[u8], extension: &str) -> Result<Vec<u8>, SanitizeError> {
        if !Self::is_supported(extension) {
            return Err(SanitizeError::UnsupportedExtension(extension.to_string()));
        }
        let format = ImageFormat::from_extension(extension)
            .ok_or_else(|| SanitizeError::UnsupportedExtension(extension.to_string()))?;

        let decoded = image::load_from_memory_with_format(bytes, format)?;
        let fitted = self.fit_within_bounds(decoded)?;

        let mut out = Cursor::new(Vec::new());
        image::write_buffer_with_format(
            &mut out,
            fitted.as_bytes(),
            fitted.width(),
            fitted.height(),
            fitted.color(),
            format,
        )?;
        Ok(out.into_inner())
    }

    fn fit_within_bounds(&self, image: DynamicImage) -> Result<DynamicImage, SanitizeError> {
        let Some((dst_width, dst_height)) = self.target_size(image.width(), image.height())
        else {
            return Ok(image);
        };

        let mut dst_image = DynamicImage::new(dst_width, dst_height, image.color());
        let mut resizer = Resizer::new();
        resizer.resize(
            &image,
            &mut dst_image,
            Some(
                &ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::CatmullRom)),
            ),
        )?;

        Ok(dst_image)
    }

    /// Returns `None` when no resize is needed.
    fn target_size(&self, width: u32, height: u32) -> Option<(u32, u32)> {
        if width.max(height) <= self.bounds.longest_edge() {
            return None;
        }

        let scale = (self.bounds.width as f64 / width as f64)
            .min(self.bounds.height as f64 / height as f64)
            .min(1.0);
        let dst_width = ((width as f64 * scale).round() as u32).clamp(1, self.bounds.width);
        let dst_height = ((height as f64 * scale).round() as u32).clamp(1, self.bounds.height);
        Some((dst_width, dst_height))
    }
}

impl Default for Sanitizer {
    fn default() -> Self {
        Self::new(ImageBounds::DEFAULT)
    }
}
