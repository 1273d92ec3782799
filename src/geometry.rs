//! Screen-space rectangles and hit testing

/// Rectangle in panel (or root) coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    /// Strict containment: a point lying on any edge is outside.
    ///
    /// Widget hit testing uses this so that a pointer sitting exactly on the
    /// border shared by two neighbours dispatches to neither of them.
    pub fn contains_strict(&self, px: i32, py: i32) -> bool {
        point_in_rect(px, py, self.x, self.y, self.width, self.height)
    }

    /// Half-open containment (`[x, x + width)`), used for task buttons.
    pub fn contains(&self, px: i32, py: i32) -> bool {
        px >= self.x && px < self.x + self.width && py >= self.y && py < self.y + self.height
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }
}

/// Check if point is strictly inside rectangle
pub fn point_in_rect(px: i32, py: i32, x: i32, y: i32, w: i32, h: i32) -> bool {
    px > x && px < x + w && py > y && py < y + h
}
