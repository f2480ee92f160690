// src/raster.rs - Binary raster model shared by the skeleton engine

use image::{GrayImage, Luma};
use serde::{Deserialize, Serialize};
use std::ops::Add;

use crate::errors::{HyphaError, Result};

/// Raster-relative pixel coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Coord {
    pub x: i32,
    pub y: i32,
}

impl Coord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

impl Add for Coord {
    type Output = Coord;

    fn add(self, rhs: Coord) -> Coord {
        self.offset(rhs.x, rhs.y)
    }
}

/// The 8 neighbours of a pixel in clockwise order, starting top-left
pub const NEIGHBOURS_CLOCKWISE: [(i32, i32); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
];

/// Which raw grey value is foreground and which is background.
///
/// Fixed per input image and carried by its raster, never shared globally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Polarity {
    pub foreground: u8,
    pub background: u8,
}

impl Polarity {
    pub const fn new(foreground: u8, background: u8) -> Self {
        Self { foreground, background }
    }

    /// Binary convention of a look-up table: an inverted LUT displays 255 as
    /// black, so foreground is 255; a normal LUT makes 0 the foreground.
    pub const fn from_lut(inverted: bool) -> Self {
        if inverted {
            Self::new(255, 0)
        } else {
            Self::new(0, 255)
        }
    }
}

impl Default for Polarity {
    fn default() -> Self {
        Self::from_lut(true)
    }
}

/// Axis-aligned rectangle (bounding box) in raster coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    #[inline]
    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && y >= self.y && x - self.x < self.width && y - self.y < self.height
    }

    pub fn origin(&self) -> Coord {
        Coord::new(self.x as i32, self.y as i32)
    }
}

/// Owned 2-D binary raster, row-major, one byte per pixel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryRaster {
    width: u32,
    height: u32,
    data: Vec<u8>,
    polarity: Polarity,
}

impl BinaryRaster {
    /// Create a raster filled with background
    pub fn new(width: u32, height: u32, polarity: Polarity) -> Self {
        Self {
            width,
            height,
            data: vec![polarity.background; width as usize * height as usize],
            polarity,
        }
    }

    /// Wrap raw pixel values; the values are not checked for binariness here
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>, polarity: Polarity) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(HyphaError::EmptyRaster);
        }

        let expected = width as usize * height as usize;
        if data.len() != expected {
            return Err(HyphaError::DimensionMismatch {
                expected,
                actual: data.len(),
            });
        }

        Ok(Self { width, height, data, polarity })
    }

    /// Build a raster from an 8-bit greyscale image
    pub fn from_luma(image: &GrayImage, polarity: Polarity) -> Result<Self> {
        let (width, height) = image.dimensions();
        Self::from_raw(width, height, image.as_raw().clone(), polarity)
    }

    pub fn to_luma(&self) -> GrayImage {
        let mut image = GrayImage::new(self.width, self.height);
        for (x, y, pixel) in image.enumerate_pixels_mut() {
            *pixel = Luma([self.data[self.index(x, y)]]);
        }
        image
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[inline]
    pub fn polarity(&self) -> Polarity {
        self.polarity
    }

    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    #[inline]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height
    }

    /// Raw value at (x, y), None outside the raster
    #[inline]
    pub fn get(&self, x: i32, y: i32) -> Option<u8> {
        if self.in_bounds(x, y) {
            Some(self.data[self.index(x as u32, y as u32)])
        } else {
            None
        }
    }

    /// Outside the raster counts as not foreground
    #[inline]
    pub fn is_foreground(&self, x: i32, y: i32) -> bool {
        self.get(x, y) == Some(self.polarity.foreground)
    }

    #[inline]
    pub fn is_foreground_at(&self, c: Coord) -> bool {
        self.is_foreground(c.x, c.y)
    }

    /// Outside the raster counts as not background
    #[inline]
    pub fn is_background(&self, x: i32, y: i32) -> bool {
        self.get(x, y) == Some(self.polarity.background)
    }

    pub fn set(&mut self, x: u32, y: u32, value: u8) {
        if x < self.width && y < self.height {
            let idx = self.index(x, y);
            self.data[idx] = value;
        }
    }

    pub fn set_foreground(&mut self, x: u32, y: u32) {
        self.set(x, y, self.polarity.foreground);
    }

    /// Delete a pixel; true if it was foreground. Outside coordinates are ignored.
    pub fn clear(&mut self, c: Coord) -> bool {
        if !self.in_bounds(c.x, c.y) {
            return false;
        }
        let idx = self.index(c.x as u32, c.y as u32);
        let was_foreground = self.data[idx] == self.polarity.foreground;
        self.data[idx] = self.polarity.background;
        was_foreground
    }

    pub fn foreground_count(&self) -> usize {
        let fg = self.polarity.foreground;
        self.data.iter().filter(|&&v| v == fg).count()
    }

    /// Foreground pixel count at each of the 8 neighbours of (x, y)
    pub fn foreground_neighbours(&self, x: i32, y: i32) -> usize {
        NEIGHBOURS_CLOCKWISE
            .iter()
            .filter(|&&(dx, dy)| self.is_foreground(x + dx, y + dy))
            .count()
    }

    pub fn histogram(&self) -> [usize; 256] {
        let mut histogram = [0usize; 256];
        for &v in &self.data {
            histogram[v as usize] += 1;
        }
        histogram
    }

    /// Every pixel must hold exactly the foreground or the background value
    pub fn check_binary(&self) -> Result<()> {
        let Polarity { foreground, background } = self.polarity;
        let histogram = self.histogram();

        match histogram
            .iter()
            .enumerate()
            .find(|&(value, &count)| count > 0 && value as u8 != foreground && value as u8 != background)
        {
            Some((value, _)) => Err(HyphaError::NonBinaryRaster {
                value: value as u8,
                foreground,
                background,
            }),
            None => Ok(()),
        }
    }

    /// Copy a sub-rectangle into a new raster with the same polarity
    pub fn crop(&self, region: Region) -> Result<Self> {
        let fits_x = region.x.checked_add(region.width).map_or(false, |r| r <= self.width);
        let fits_y = region.y.checked_add(region.height).map_or(false, |b| b <= self.height);
        if region.width == 0 || region.height == 0 || !fits_x || !fits_y {
            return Err(HyphaError::InvalidRegion(format!(
                "{:?} does not fit a {}x{} raster",
                region, self.width, self.height
            )));
        }

        let mut data = Vec::with_capacity(region.width as usize * region.height as usize);
        for y in region.y..region.y + region.height {
            let start = self.index(region.x, y);
            data.extend_from_slice(&self.data[start..start + region.width as usize]);
        }

        Self::from_raw(region.width, region.height, data, self.polarity)
    }
}
