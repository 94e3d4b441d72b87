//! The in-memory image container and its pixel views
//!
//! The morphology engine never reads the buffer it writes: a primitive
//! consumes a read-only source [`Image`] through [`Image::virtual_window`]
//! and writes a distinct destination image row by row. Window requests may
//! extend past the image bounds; out-of-bounds coordinates replicate the
//! nearest edge pixel.

use crate::error::{CoreError, CoreResult};
use crate::pixel::Pixel;

/// The colorspace of the stored samples
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Colorspace {
    #[default]
    Rgb,
    /// Four-color: the K channel lives in `Pixel::index`
    Cmyk,
}

/// A rectangular grid of pixels
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    width: usize,
    height: usize,
    pixels: Vec<Pixel>,
    /// True when the image carries a meaningful alpha channel
    pub matte: bool,
    pub colorspace: Colorspace,
}

impl Image {
    /// Create an image filled with opaque black
    pub fn new(width: usize, height: usize) -> CoreResult<Self> {
        if width == 0 || height == 0 {
            return Err(CoreError::InvalidDimensions(format!(
                "{}x{} image",
                width, height
            )));
        }
        Ok(Image {
            width,
            height,
            pixels: vec![Pixel::default(); width * height],
            matte: false,
            colorspace: Colorspace::Rgb,
        })
    }

    /// Create an image filled with the given pixel
    pub fn filled(width: usize, height: usize, pixel: Pixel) -> CoreResult<Self> {
        let mut image = Image::new(width, height)?;
        image.pixels.fill(pixel);
        Ok(image)
    }

    /// Create an image by evaluating `f` at every coordinate
    pub fn from_fn<F>(width: usize, height: usize, mut f: F) -> CoreResult<Self>
    where
        F: FnMut(usize, usize) -> Pixel,
    {
        let mut image = Image::new(width, height)?;
        for y in 0..height {
            for x in 0..width {
                image.pixels[y * width + x] = f(x, y);
            }
        }
        Ok(image)
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// The larger of width and height
    pub fn max_dimension(&self) -> usize {
        self.width.max(self.height)
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<&Pixel> {
        if x < self.width && y < self.height {
            Some(&self.pixels[y * self.width + x])
        } else {
            None
        }
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, pixel: Pixel) {
        if x < self.width && y < self.height {
            self.pixels[y * self.width + x] = pixel;
        }
    }

    pub fn pixels(&self) -> &[Pixel] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [Pixel] {
        &mut self.pixels
    }

    /// Materialize a `w`-by-`h` window whose top-left corner is at
    /// (`x0`, `y0`) in image coordinates. The window may extend beyond the
    /// image on any side; such positions replicate the nearest edge pixel.
    pub fn virtual_window(&self, x0: i64, y0: i64, w: usize, h: usize) -> Vec<Pixel> {
        let mut window = Vec::with_capacity(w * h);
        for v in 0..h as i64 {
            let sy = (y0 + v).clamp(0, self.height as i64 - 1) as usize;
            let row = &self.pixels[sy * self.width..(sy + 1) * self.width];
            for u in 0..w as i64 {
                let sx = (x0 + u).clamp(0, self.width as i64 - 1) as usize;
                window.push(row[sx]);
            }
        }
        window
    }
}
