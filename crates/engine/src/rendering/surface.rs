use std::path::Path;

use image::{ImageFormat, ImageResult, Rgba, RgbaImage};

use super::Palette;

/// 8-bit indexed drawing target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Surface {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Surface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    pub fn index_of(&self, x: u32, y: u32) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<u8> {
        self.index_of(x, y).map(|index| self.pixels[index])
    }

    pub fn fill(&mut self, value: u8) {
        self.pixels.fill(value);
    }

    /// Copies a `src_width` x `src_height` indexed buffer with its top-left
    /// corner at (`dst_x`, `dst_y`), clipping against the surface bounds.
    pub fn blit(&mut self, src: &[u8], src_width: u32, src_height: u32, dst_x: i32, dst_y: i32) {
        if src_width == 0 || src.len() < src_width as usize * src_height as usize {
            return;
        }

        for row in 0..src_height as i32 {
            let y = dst_y + row;
            if y < 0 || y >= self.height as i32 {
                continue;
            }

            let first_col = (-dst_x).max(0);
            let last_col = (self.width as i32 - dst_x).min(src_width as i32);
            if first_col >= last_col {
                continue;
            }

            let src_start = row as usize * src_width as usize + first_col as usize;
            let src_end = row as usize * src_width as usize + last_col as usize;
            let dst_start = y as usize * self.width as usize + (dst_x + first_col) as usize;
            let len = src_end - src_start;
            self.pixels[dst_start..dst_start + len].copy_from_slice(&src[src_start..src_end]);
        }
    }

    pub fn to_rgba_image(&self, palette: &Palette) -> RgbaImage {
        RgbaImage::from_fn(self.width, self.height, |x, y| {
            let index = self.pixels[y as usize * self.width as usize + x as usize];
            let entry = palette.entry(index);
            Rgba([entry.red, entry.green, entry.blue, 255])
        })
    }

    pub fn save_png(&self, path: &Path, palette: &Palette) -> ImageResult<()> {
        self.to_rgba_image(palette)
            .save_with_format(path, ImageFormat::Png)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::rendering::PaletteEntry;

    #[test]
    fn blit_clips_against_every_edge() {
        let mut surface = Surface::new(4, 3);
        let src = [1u8, 2, 3, 4, 5, 6];

        surface.blit(&src, 3, 2, -1, 2);

        assert_eq!(surface.pixel(0, 2), Some(2));
        assert_eq!(surface.pixel(1, 2), Some(3));
        assert_eq!(surface.pixel(2, 2), Some(0));
        assert_eq!(surface.pixels()[..8], [0u8; 8]);
    }

    #[test]
    fn blit_ignores_short_source_buffers() {
        let mut surface = Surface::new(2, 2);
        surface.blit(&[9u8; 3], 2, 2, 0, 0);
        assert_eq!(surface.pixels(), &[0u8; 4]);
    }

    #[test]
    fn png_export_uses_palette_colours() {
        let temp = TempDir::new().expect("temp");
        let path = temp.path().join("shot.png");
        let mut palette = Palette::default();
        palette.set_entry(
            7,
            PaletteEntry {
                red: 200,
                green: 100,
                blue: 50,
            },
        );
        let mut surface = Surface::new(2, 1);
        surface.pixels_mut()[1] = 7;

        let image = surface.to_rgba_image(&palette);
        assert_eq!(image.get_pixel(1, 0).0, [200, 100, 50, 255]);
        assert_eq!(image.get_pixel(0, 0).0, [0, 0, 0, 255]);

        surface.save_png(&path, &palette).expect("save");
        assert!(path.is_file());
    }
}
