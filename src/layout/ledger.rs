// Free-space bookkeeping for the packing engine.
//
// Cells are kept in a BTreeMap keyed by (distance to viewport center,
// insertion counter) so the scan for a fitting cell always starts at the
// region closest to the center.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use super::types::{Corner, Rect, Viewport};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FreeSpaceCell {
    pub corner: Corner,
    /// Anchor point; which corner of the area it denotes depends on `corner`.
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub distance: f32,
    pub tie_break: u64,
}

impl FreeSpaceCell {
    pub fn area(&self) -> Rect {
        self.corner.cell_rect(self.x, self.y, self.width, self.height)
    }
}

/// Orientations a word can take inside a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fit {
    Horizontal,
    Vertical,
    Both,
}

#[derive(Debug, Clone, Copy)]
struct CellKey {
    distance: f32,
    tie_break: u64,
}

impl PartialEq for CellKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for CellKey {}

impl Ord for CellKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then_with(|| self.tie_break.cmp(&other.tie_break))
    }
}

impl PartialOrd for CellKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Clone)]
pub struct FreeSpaceLedger {
    viewport: Viewport,
    cells: BTreeMap<CellKey, FreeSpaceCell>,
    next_tie_break: u64,
}

impl FreeSpaceLedger {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            cells: BTreeMap::new(),
            next_tie_break: 1,
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Cells in scan order, nearest to the center first.
    pub fn cells(&self) -> impl Iterator<Item = &FreeSpaceCell> + '_ {
        self.cells.values()
    }

    /// Records a free region. Returns `false` when the region is empty or its
    /// anchor lies outside the viewport, in which case nothing is stored.
    pub fn insert(&mut self, corner: Corner, x: f32, y: f32, width: f32, height: f32) -> bool {
        if !(width > 0.0 && height > 0.0) {
            return false;
        }
        if !(x >= 0.0 && y >= 0.0 && x < self.viewport.width && y < self.viewport.height) {
            return false;
        }
        let (cx, cy) = self.viewport.center();
        let distance = ((cx - x) * (cx - x) + (cy - y) * (cy - y)).sqrt();
        let tie_break = self.next_tie_break;
        self.next_tie_break += 1;
        self.cells.insert(
            CellKey {
                distance,
                tie_break,
            },
            FreeSpaceCell {
                corner,
                x,
                y,
                width,
                height,
                distance,
                tie_break,
            },
        );
        true
    }

    /// Removes and returns the cell closest to the center that can hold a
    /// `width` x `height` box, either as is or rotated a quarter turn.
    pub fn take_nearest_fitting(
        &mut self,
        width: f32,
        height: f32,
        vertical_allowed: bool,
    ) -> Option<(FreeSpaceCell, Fit)> {
        let (key, fit) = self.cells.iter().find_map(|(key, cell)| {
            let horizontal = width <= cell.width && height <= cell.height;
            let vertical = vertical_allowed && height <= cell.width && width <= cell.height;
            let fit = match (horizontal, vertical) {
                (true, true) => Fit::Both,
                (true, false) => Fit::Horizontal,
                (false, true) => Fit::Vertical,
                (false, false) => return None,
            };
            Some((*key, fit))
        })?;
        let cell = self.cells.remove(&key)?;
        Some((cell, fit))
    }
}
