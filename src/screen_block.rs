use std::iter::FusedIterator;
use std::num::NonZeroU32;

use itertools::Itertools as _;

use crate::geometry::{ScreenPoint, ScreenSize};

/// Half-open rectangle of pixels, `min` inclusive, `max` exclusive.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ScreenBlock {
    pub min: ScreenPoint,
    pub max: ScreenPoint,
}

impl ScreenBlock {
    pub fn new(min: ScreenPoint, max: ScreenPoint) -> ScreenBlock {
        ScreenBlock { min, max }
    }

    pub fn from_size(size: ScreenSize) -> ScreenBlock {
        ScreenBlock {
            min: ScreenPoint::origin(),
            max: ScreenPoint::new(size.x, size.y),
        }
    }

    pub fn width(&self) -> u32 {
        self.max.x.saturating_sub(self.min.x)
    }

    pub fn height(&self) -> u32 {
        self.max.y.saturating_sub(self.min.y)
    }

    pub fn area(&self) -> u32 {
        self.width() * self.height()
    }

    pub fn is_empty(&self) -> bool {
        self.area() == 0
    }

    pub fn contains(&self, p: ScreenPoint) -> bool {
        p.x >= self.min.x && p.x < self.max.x && p.y >= self.min.y && p.y < self.max.y
    }

    /// Iterates over pixel coordinates inside the block in C order
    /// (x changes first, then y).
    pub fn internal_points(&self) -> InternalPoints {
        if self.is_empty() {
            InternalPoints::empty()
        } else {
            InternalPoints {
                min_x: self.min.x,
                max: self.max,
                cursor: self.min,
            }
        }
    }

    /// Splits the block into tiles of at most `tile_size` * `tile_size`
    /// pixels in row-major order. Tiles at the right and bottom edge are
    /// clipped when the tile size doesn't evenly divide the block size.
    pub fn tile_ordering(&self, tile_size: NonZeroU32) -> Vec<ScreenBlock> {
        let tile_size = tile_size.get();
        (self.min.y..self.max.y)
            .step_by(tile_size as usize)
            .cartesian_product((self.min.x..self.max.x).step_by(tile_size as usize))
            .map(|(y, x)| ScreenBlock {
                min: ScreenPoint::new(x, y),
                max: ScreenPoint::new(
                    (x + tile_size).min(self.max.x),
                    (y + tile_size).min(self.max.y),
                ),
            })
            .collect()
    }
}

#[derive(Copy, Clone, Debug)]
pub struct InternalPoints {
    min_x: u32,
    max: ScreenPoint,
    cursor: ScreenPoint,
}

impl InternalPoints {
    /// An iterator that returns no points.
    fn empty() -> InternalPoints {
        InternalPoints {
            min_x: 1,
            max: ScreenPoint::origin(),
            cursor: ScreenPoint::origin(),
        }
    }
}

impl Iterator for InternalPoints {
    type Item = ScreenPoint;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor.y >= self.max.y {
            return None;
        }

        let ret = self.cursor;

        debug_assert!(self.cursor.x < self.max.x);
        self.cursor.x += 1;
        if self.cursor.x >= self.max.x {
            self.cursor.x = self.min_x;
            self.cursor.y += 1;
        }

        Some(ret)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.len();
        (len, Some(len))
    }
}

impl ExactSizeIterator for InternalPoints {
    fn len(&self) -> usize {
        if self.cursor.y >= self.max.y {
            0
        } else {
            let whole_rows = (self.max.y - self.cursor.y - 1) * (self.max.x - self.min_x);
            let current_row = self.max.x - self.cursor.x;
            (whole_rows + current_row) as usize
        }
    }
}

impl FusedIterator for InternalPoints {}
