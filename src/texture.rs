use std::path::Path;

use anyhow::{Context, Result};
use log::info;

/// Pixel layout a decoded texture is converted to before upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// 32-bit RGBA, one byte per channel.
    Rgba8,
    /// 8-bit single-channel grayscale.
    Gray8,
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> u32 {
        match self {
            Self::Rgba8 => 4,
            Self::Gray8 => 1,
        }
    }
}

/// Decoded image data ready for upload, always tightly packed.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureData {
    width: u32,
    height: u32,
    format: PixelFormat,
    pixels: Vec<u8>,
}

impl TextureData {
    pub fn from_pixels(width: u32, height: u32, format: PixelFormat, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(
            pixels.len() as u32,
            width * height * format.bytes_per_pixel()
        );
        Self {
            width,
            height,
            format,
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn bytes_per_row(&self) -> u32 {
        self.width * self.format.bytes_per_pixel()
    }

    /// Full mip chain starting at this image and halving down to 1x1,
    /// each level box-filtered from the previous one. The GPU side has no
    /// mipmap generation, so the chain is built here and uploaded level by
    /// level.
    pub fn mip_chain(&self) -> Vec<TextureData> {
        let mut levels = vec![self.clone()];
        while let Some(next) = levels.last().and_then(TextureData::next_mip) {
            levels.push(next);
        }
        levels
    }

    fn next_mip(&self) -> Option<TextureData> {
        if self.width <= 1 && self.height <= 1 {
            return None;
        }
        let width = (self.width / 2).max(1);
        let height = (self.height / 2).max(1);
        let channels = self.format.bytes_per_pixel() as usize;
        let mut pixels = Vec::with_capacity((width * height) as usize * channels);

        for y in 0..height {
            for x in 0..width {
                for channel in 0..channels {
                    let mut sum = 0u32;
                    for (dx, dy) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
                        let sx = (x * 2 + dx).min(self.width - 1);
                        let sy = (y * 2 + dy).min(self.height - 1);
                        let index = ((sy * self.width + sx) as usize) * channels + channel;
                        sum += u32::from(self.pixels[index]);
                    }
                    pixels.push((sum / 4) as u8);
                }
            }
        }

        Some(TextureData::from_pixels(width, height, self.format, pixels))
    }
}

/// Decodes an image file and converts it to the requested pixel format,
/// whatever bit depth the source carries.
///
/// Scanlines are flipped so row 0 of the returned pixels is the image's
/// bottom row; v=1 then samples the top of the picture, which is the
/// orientation the quad UVs assume.
pub fn load(path: &Path, format: PixelFormat) -> Result<TextureData> {
    let decoded = image::open(path)
        .with_context(|| format!("failed to decode {}", path.display()))?
        .flipv();
    info!(
        "read a {}-bit texture from {}",
        decoded.color().bits_per_pixel(),
        path.display()
    );

    let texture = match format {
        PixelFormat::Rgba8 => {
            let rgba = decoded.into_rgba8();
            TextureData::from_pixels(rgba.width(), rgba.height(), format, rgba.into_raw())
        }
        PixelFormat::Gray8 => {
            let gray = decoded.into_luma8();
            TextureData::from_pixels(gray.width(), gray.height(), format, gray.into_raw())
        }
    };
    info!(
        "decoded {} x {} pixels for upload",
        texture.width(),
        texture.height()
    );
    Ok(texture)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};

    fn write_png(image: &RgbaImage) -> tempfile::NamedTempFile {
        let file = tempfile::Builder::new()
            .suffix(".png")
            .tempfile()
            .expect("temp file");
        image
            .save_with_format(file.path(), ImageFormat::Png)
            .expect("encode png");
        file
    }

    #[test]
    fn decodes_rgba_png_round_trip() {
        let mut source = RgbaImage::new(4, 2);
        source.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        source.put_pixel(3, 1, Rgba([0, 0, 255, 128]));
        let file = write_png(&source);

        let texture = load(file.path(), PixelFormat::Rgba8).unwrap();
        assert_eq!((texture.width(), texture.height()), (4, 2));
        assert_eq!(texture.bytes_per_row(), 16);
        // Row 0 of the pixels is the image's bottom scanline, so the source
        // top-left lands in the second row and the bottom-right in the first.
        assert_eq!(&texture.pixels()[3 * 4..4 * 4], &[0, 0, 255, 128]);
        assert_eq!(&texture.pixels()[4 * 4..5 * 4], &[255, 0, 0, 255]);
    }

    #[test]
    fn loaded_pixels_start_at_the_image_bottom() {
        let mut source = RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 255]));
        source.put_pixel(0, 1, Rgba([200, 200, 200, 255]));
        let file = write_png(&source);

        let texture = load(file.path(), PixelFormat::Gray8).unwrap();
        // The bright pixel sits on the source's bottom row and must come
        // out first.
        assert!(texture.pixels()[0] > 100);
        assert!(texture.pixels()[2] < 100);
    }

    #[test]
    fn converts_color_sources_to_grayscale() {
        let source = RgbaImage::from_pixel(2, 2, Rgba([255, 255, 255, 255]));
        let file = write_png(&source);

        let texture = load(file.path(), PixelFormat::Gray8).unwrap();
        assert_eq!(texture.format(), PixelFormat::Gray8);
        assert_eq!(texture.pixels().len(), 4);
        assert_eq!(texture.pixels()[0], 255);
    }

    #[test]
    fn undecodable_input_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        use std::io::Write;
        file.write_all(b"not an image").unwrap();
        assert!(load(file.path(), PixelFormat::Rgba8).is_err());
    }

    #[test]
    fn mip_chain_halves_down_to_one_pixel() {
        let base = TextureData::from_pixels(4, 4, PixelFormat::Rgba8, vec![0; 4 * 4 * 4]);
        let chain = base.mip_chain();
        let dims: Vec<_> = chain
            .iter()
            .map(|level| (level.width(), level.height()))
            .collect();
        assert_eq!(dims, vec![(4, 4), (2, 2), (1, 1)]);
    }

    #[test]
    fn mip_chain_handles_non_square_sizes() {
        let base = TextureData::from_pixels(4, 1, PixelFormat::Gray8, vec![0; 4]);
        let dims: Vec<_> = base
            .mip_chain()
            .iter()
            .map(|level| (level.width(), level.height()))
            .collect();
        assert_eq!(dims, vec![(4, 1), (2, 1), (1, 1)]);
    }

    #[test]
    fn downsampling_averages_the_source_quad() {
        let base = TextureData::from_pixels(2, 2, PixelFormat::Gray8, vec![0, 100, 50, 150]);
        let chain = base.mip_chain();
        assert_eq!(chain[1].pixels(), &[75]);
    }
}
