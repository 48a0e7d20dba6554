use std::io::Cursor;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbImage};

use crate::error::{Flux2Error, Result};
use crate::types::OutputFormat;

/// JPEG quality used when encoding tensors for request payloads.
const JPEG_QUALITY: u8 = 95;

/// A single RGB image as the editor passes it between nodes.
///
/// Channel values are `f32` in `[0, 1]`, stored row-major as
/// height × width × 3 (`data.len() == width * height * 3`). There is no
/// batch dimension. Grayscale sources are expanded to three channels on
/// decode; alpha is discarded.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageTensor {
    pub width: u32,
    pub height: u32,
    pub data: Vec<f32>,
}

impl ImageTensor {
    /// Create a tensor from raw channel data.
    ///
    /// Fails when `data.len()` does not match `width * height * 3`.
    pub fn new(width: u32, height: u32, data: Vec<f32>) -> Result<Self> {
        let expected = width as usize * height as usize * 3;
        if data.len() != expected {
            return Err(Flux2Error::InvalidParameter(format!(
                "tensor data length {} does not match {}x{}x3 = {}",
                data.len(),
                width,
                height,
                expected
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// All-black fallback tensor, used in place of a crash when an API run
    /// failed.
    pub fn blank(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0.0; width as usize * height as usize * 3],
        }
    }

    /// Decode downloaded bytes (PNG, JPEG, ...) into a tensor.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let rgb = image::load_from_memory(bytes)?.to_rgb8();
        let (width, height) = rgb.dimensions();
        let data = rgb
            .into_raw()
            .into_iter()
            .map(|v| v as f32 / 255.0)
            .collect();
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Encode the tensor as PNG or JPEG bytes. Values are clamped to
    /// `[0, 1]` before quantization.
    pub fn to_bytes(&self, format: OutputFormat) -> Result<Vec<u8>> {
        let rgb = self.to_rgb8()?;
        let mut bytes = Vec::new();
        match format {
            OutputFormat::Png => {
                PngEncoder::new(Cursor::new(&mut bytes)).write_image(
                    rgb.as_raw(),
                    self.width,
                    self.height,
                    ExtendedColorType::Rgb8,
                )?;
            }
            OutputFormat::Jpeg => {
                JpegEncoder::new_with_quality(Cursor::new(&mut bytes), JPEG_QUALITY)
                    .write_image(
                        rgb.as_raw(),
                        self.width,
                        self.height,
                        ExtendedColorType::Rgb8,
                    )?;
            }
        }
        Ok(bytes)
    }

    /// Encode the tensor to a standard base64 string for request payloads.
    pub fn to_base64(&self, format: OutputFormat) -> Result<String> {
        Ok(STANDARD.encode(self.to_bytes(format)?))
    }

    fn to_rgb8(&self) -> Result<RgbImage> {
        let pixels = self
            .data
            .iter()
            .map(|v| (v.clamp(0.0, 1.0) * 255.0).round() as u8)
            .collect();
        RgbImage::from_raw(self.width, self.height, pixels).ok_or_else(|| {
            Flux2Error::InvalidParameter(format!(
                "tensor data length {} does not match {}x{}x3",
                self.data.len(),
                self.width,
                self.height
            ))
        })
    }
}

impl Default for ImageTensor {
    /// The 512×512 blank fallback.
    fn default() -> Self {
        Self::blank(512, 512)
    }
}
