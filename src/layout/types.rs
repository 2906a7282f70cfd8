use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle anchored at its top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Strict overlap test; rectangles sharing only an edge do not overlap.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> (f32, f32) {
        (self.width / 2.0, self.height / 2.0)
    }

    pub fn is_degenerate(&self) -> bool {
        !(self.width.is_finite() && self.height.is_finite())
            || self.width <= 0.0
            || self.height <= 0.0
    }

    /// Whether `rect` lies entirely inside `[0, width] x [0, height]`.
    pub fn contains(&self, rect: &Rect) -> bool {
        rect.x >= 0.0 && rect.y >= 0.0 && rect.right() <= self.width && rect.bottom() <= self.height
    }
}

/// Which corner of a previously placed word a free-space cell grew from.
///
/// The tag fixes the direction a word grows from the cell's anchor point
/// and the direction leftover space is split towards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Corner {
    LeftBottom,
    LeftTop,
    RightTop,
    RightBottom,
}

impl Corner {
    /// Multipliers applied to the word size to find its top-left corner.
    pub fn placement_signs(self) -> (f32, f32) {
        match self {
            Corner::LeftBottom => (0.0, -1.0),
            Corner::LeftTop => (0.0, 0.0),
            Corner::RightTop => (-1.0, 0.0),
            Corner::RightBottom => (-1.0, -1.0),
        }
    }

    /// Multipliers applied to the word size to find the anchors of leftover cells.
    pub fn split_signs(self) -> (f32, f32) {
        match self {
            Corner::LeftBottom => (1.0, -1.0),
            Corner::LeftTop => (1.0, 1.0),
            Corner::RightTop => (-1.0, 1.0),
            Corner::RightBottom => (-1.0, -1.0),
        }
    }

    /// The area a cell of this corner covers, given its anchor and size.
    pub fn cell_rect(self, x: f32, y: f32, width: f32, height: f32) -> Rect {
        let (sx, sy) = self.split_signs();
        let left = if sx < 0.0 { x - width } else { x };
        let top = if sy < 0.0 { y - height } else { y };
        Rect::new(left, top, width, height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

impl Orientation {
    pub fn rotation_degrees(self) -> u16 {
        match self {
            Orientation::Horizontal => 0,
            Orientation::Vertical => 270,
        }
    }
}

/// A word positioned inside the viewport.
///
/// `x`, `y`, `width` and `height` describe the unrotated text box the way a
/// renderer positions it; rotation happens about the box center. Use
/// [`Placement::bounds`] for the on-screen footprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    pub id: String,
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub rotation: u16,
    pub font_size: f32,
    pub color: String,
    pub group_rank: Option<u32>,
}

impl Placement {
    pub fn is_vertical(&self) -> bool {
        self.rotation == 270
    }

    pub fn bounds(&self) -> Rect {
        Self::footprint(self.x, self.y, self.width, self.height, self.rotation)
    }

    /// On-screen extent of a `width` x `height` text box at `(x, y)` rotated
    /// `rotation` degrees about its center.
    pub fn footprint(x: f32, y: f32, width: f32, height: f32, rotation: u16) -> Rect {
        if rotation == 270 {
            let (cx, cy) = Rect::new(x, y, width, height).center();
            Rect::new(cx - height / 2.0, cy - width / 2.0, height, width)
        } else {
            Rect::new(x, y, width, height)
        }
    }
}

/// Outcome of one packing pass at one font scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassResult {
    pub placements: Vec<Placement>,
    pub scale: f32,
    pub coverage_ratio: f32,
}

impl PassResult {
    /// An empty input is vacuously fully covered.
    pub fn empty(scale: f32) -> Self {
        Self {
            placements: Vec::new(),
            scale,
            coverage_ratio: 1.0,
        }
    }

    pub fn from_placements(placements: Vec<Placement>, scale: f32, total: usize) -> Self {
        let coverage_ratio = if total == 0 {
            1.0
        } else {
            placements.len() as f32 / total as f32
        };
        Self {
            placements,
            scale,
            coverage_ratio,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placement(x: f32, y: f32, w: f32, h: f32, rotation: u16) -> Placement {
        Placement {
            id: "a".into(),
            text: "a".into(),
            x,
            y,
            width: w,
            height: h,
            rotation,
            font_size: 12.0,
            color: "#000000".into(),
            group_rank: None,
        }
    }

    #[test]
    fn rects_sharing_an_edge_do_not_overlap() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(10.0, 0.0, 10.0, 10.0);
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&Rect::new(9.0, 9.0, 5.0, 5.0)));
    }

    #[test]
    fn vertical_bounds_swap_about_center() {
        let p = placement(100.0, 50.0, 60.0, 20.0, 270);
        let bounds = p.bounds();
        assert_eq!(bounds, Rect::new(120.0, 30.0, 20.0, 60.0));
        assert_eq!(bounds.center(), (130.0, 60.0));
    }

    #[test]
    fn horizontal_bounds_are_the_text_box() {
        let p = placement(1.0, 2.0, 3.0, 4.0, 0);
        assert_eq!(p.bounds(), Rect::new(1.0, 2.0, 3.0, 4.0));
    }

    #[test]
    fn cell_rect_follows_corner_direction() {
        assert_eq!(
            Corner::RightBottom.cell_rect(50.0, 50.0, 10.0, 20.0),
            Rect::new(40.0, 30.0, 10.0, 20.0)
        );
        assert_eq!(
            Corner::LeftBottom.cell_rect(50.0, 50.0, 10.0, 20.0),
            Rect::new(50.0, 30.0, 10.0, 20.0)
        );
    }

    #[test]
    fn degenerate_viewports() {
        assert!(Viewport::new(0.0, 10.0).is_degenerate());
        assert!(Viewport::new(10.0, -1.0).is_degenerate());
        assert!(Viewport::new(f32::NAN, 10.0).is_degenerate());
        assert!(!Viewport::new(10.0, 10.0).is_degenerate());
    }

    #[test]
    fn empty_pass_is_fully_covered() {
        assert_eq!(PassResult::empty(1.0).coverage_ratio, 1.0);
        assert_eq!(
            PassResult::from_placements(Vec::new(), 0.7, 4).coverage_ratio,
            0.0
        );
    }
}
