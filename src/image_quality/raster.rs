use image::{DynamicImage, GrayAlphaImage, GrayImage, RgbImage, RgbaImage};
use serde::Serialize;

use crate::error::{QualityError, Result};

/// Decoded raster: row-major, interleaved 8-bit channels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    pixels: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
}

impl RasterImage {
    /// Wrap a pixel buffer. Fails on zero dimensions, unsupported channel
    /// counts (1 to 4 are accepted) or a buffer of the wrong length.
    pub fn new(pixels: Vec<u8>, width: u32, height: u32, channels: u8) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(QualityError::InvalidImage(format!(
                "zero-size raster {width}x{height}"
            )));
        }
        if !(1..=4).contains(&channels) {
            return Err(QualityError::InvalidImage(format!(
                "unsupported channel count {channels}"
            )));
        }

        let expected = width as usize * height as usize * channels as usize;
        if pixels.len() != expected {
            return Err(QualityError::InvalidImage(format!(
                "buffer holds {} bytes, {width}x{height}x{channels} needs {expected}",
                pixels.len()
            )));
        }

        Ok(Self {
            pixels,
            width,
            height,
            channels,
        })
    }

    /// Single-channel raster filled with one intensity.
    pub fn filled(width: u32, height: u32, value: u8) -> Result<Self> {
        let len = width as usize * height as usize;
        Self::new(vec![value; len], width, height, 1)
    }

    /// Convert a decoded image, keeping grayscale as one channel and alpha
    /// when present.
    pub fn from_dynamic(img: &DynamicImage) -> Result<Self> {
        let (width, height) = (img.width(), img.height());
        let color = img.color();

        match (color.has_color(), color.has_alpha()) {
            (false, false) => Self::new(img.to_luma8().into_raw(), width, height, 1),
            (false, true) => Self::new(img.to_luma_alpha8().into_raw(), width, height, 2),
            (true, false) => Self::new(img.to_rgb8().into_raw(), width, height, 3),
            (true, true) => Self::new(img.to_rgba8().into_raw(), width, height, 4),
        }
    }

    /// Decode an encoded image (PNG, JPEG, BMP, ...) from memory.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let img = image::load_from_memory(bytes)
            .map_err(|err| QualityError::InvalidImage(format!("decode failed: {err}")))?;
        Self::from_dynamic(&img)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.width,
            height: self.height,
        }
    }

    /// Luma conversion: alpha is dropped first, color uses the BT.601 weights
    /// `0.299 R + 0.587 G + 0.114 B`, rounded back to 8 bits.
    pub fn to_intensity(&self) -> IntensityGrid {
        let step = self.channels as usize;
        let values = self
            .pixels
            .chunks_exact(step)
            .map(|px| match step {
                1 | 2 => px[0] as f64,
                _ => {
                    let luma = 0.299 * px[0] as f64 + 0.587 * px[1] as f64 + 0.114 * px[2] as f64;
                    luma.round().clamp(0.0, 255.0)
                }
            })
            .collect();

        IntensityGrid {
            values,
            width: self.width as usize,
            height: self.height as usize,
        }
    }

    /// Rebuild an `image` buffer for collaborators that need one (hashing).
    pub fn to_dynamic(&self) -> Result<DynamicImage> {
        let (w, h) = (self.width, self.height);
        let raw = self.pixels.clone();
        let img = match self.channels {
            1 => GrayImage::from_raw(w, h, raw).map(DynamicImage::ImageLuma8),
            2 => GrayAlphaImage::from_raw(w, h, raw).map(DynamicImage::ImageLumaA8),
            3 => RgbImage::from_raw(w, h, raw).map(DynamicImage::ImageRgb8),
            _ => RgbaImage::from_raw(w, h, raw).map(DynamicImage::ImageRgba8),
        };

        img.ok_or_else(|| QualityError::InvalidImage("pixel buffer does not match dimensions".into()))
    }
}

/// Width x height pair, rendered as `WxH`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn pixel_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

impl std::fmt::Display for Dimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Single-channel intensity grid in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct IntensityGrid {
    values: Vec<f64>,
    width: usize,
    height: usize,
}

impl IntensityGrid {
    pub fn from_values(values: Vec<f64>, width: usize, height: usize) -> Option<Self> {
        (values.len() == width * height).then_some(Self {
            values,
            width,
            height,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Pixel at a possibly out-of-range coordinate, mirrored without repeating
    /// the edge pixel (`dcb|abcd|cba`).
    pub fn reflected(&self, x: isize, y: isize) -> f64 {
        let xi = reflect101(x, self.width);
        let yi = reflect101(y, self.height);
        self.values[yi * self.width + xi]
    }
}

fn reflect101(i: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let last = len as isize - 1;
    let mut i = i;
    while i < 0 || i > last {
        if i < 0 {
            i = -i;
        }
        if i > last {
            i = 2 * last - i;
        }
    }
    i as usize
}

/// Population mean and standard deviation.
pub(crate) fn mean_and_std(values: &[f64]) -> Option<(f64, f64)> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    Some((mean, variance.sqrt()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_size_rejected() {
        assert!(matches!(
            RasterImage::new(Vec::new(), 0, 10, 1),
            Err(QualityError::InvalidImage(_))
        ));
        assert!(RasterImage::filled(10, 0, 0).is_err());
    }

    #[test]
    fn test_buffer_length_checked() {
        assert!(RasterImage::new(vec![0; 11], 2, 2, 3).is_err());
        assert!(RasterImage::new(vec![0; 12], 2, 2, 3).is_ok());
        assert!(RasterImage::new(vec![0; 20], 2, 2, 5).is_err());
    }

    #[test]
    fn test_rgb_and_rgba_gray_match() {
        let rgb = RasterImage::new(vec![255, 0, 0, 0, 255, 0], 2, 1, 3).unwrap();
        let rgba = RasterImage::new(vec![255, 0, 0, 10, 0, 255, 0, 200], 2, 1, 4).unwrap();

        let g1 = rgb.to_intensity();
        let g2 = rgba.to_intensity();
        assert_eq!(g1, g2);
        assert_eq!(g1.values(), &[76.0, 150.0]);
    }

    #[test]
    fn test_gray_alpha_drops_alpha() {
        let img = RasterImage::new(vec![40, 255, 80, 0], 2, 1, 2).unwrap();
        assert_eq!(img.to_intensity().values(), &[40.0, 80.0]);
    }

    #[test]
    fn test_reflect101() {
        assert_eq!(reflect101(-1, 4), 1);
        assert_eq!(reflect101(4, 4), 2);
        assert_eq!(reflect101(0, 1), 0);
        assert_eq!(reflect101(-1, 1), 0);
        assert_eq!(reflect101(-2, 2), 0);
    }

    #[test]
    fn test_dynamic_round_trip_keeps_channels() {
        let img = RasterImage::new(vec![1, 2, 3, 4, 5, 6], 2, 1, 3).unwrap();
        let dynamic = img.to_dynamic().unwrap();
        let back = RasterImage::from_dynamic(&dynamic).unwrap();
        assert_eq!(back, img);
    }

    #[test]
    fn test_dimensions_display() {
        let dims = Dimensions {
            width: 640,
            height: 480,
        };
        assert_eq!(dims.to_string(), "640x480");
        assert_eq!(dims.pixel_count(), 307_200);
    }
}
