//! Pure point and rectangle arithmetic used by the document core.
//!
//! Everything here is value math with no knowledge of entities or the
//! dependency graph. Constraint parameters (`r`, `rx`, `ry`) are real-valued
//! and deliberately unclamped, so coordinates are `f64` throughout.

use serde::{Deserialize, Serialize};

/// A position on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Linear interpolation from `self` toward `other`. `r` is not clamped:
    /// values outside `[0, 1]` extrapolate past the endpoints.
    pub fn lerp(self, other: Position, r: f64) -> Position {
        Position {
            x: self.x + (other.x - self.x) * r,
            y: self.y + (other.y - self.y) * r,
        }
    }

    pub fn translated(self, dx: f64, dy: f64) -> Position {
        Position {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Scale about a pivot, per axis: `new = (old - pivot) * factor + pivot`.
    pub fn scaled_about(self, pivot: Position, sx: f64, sy: f64) -> Position {
        Position {
            x: (self.x - pivot.x) * sx + pivot.x,
            y: (self.y - pivot.y) * sy + pivot.y,
        }
    }
}

/// An axis-aligned rectangle with a normalized origin (non-negative size).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Build a normalized rect from two opposite corners, in any order.
    pub fn from_corners(a: Position, b: Position) -> Self {
        let x = a.x.min(b.x);
        let y = a.y.min(b.y);
        Self {
            x,
            y,
            width: (a.x - b.x).abs(),
            height: (a.y - b.y).abs(),
        }
    }

    pub fn origin(&self) -> Position {
        Position::new(self.x, self.y)
    }

    /// The corner opposite the origin.
    pub fn far_corner(&self) -> Position {
        Position::new(self.x + self.width, self.y + self.height)
    }

    /// Smallest rect covering both `self` and `other`.
    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = (self.x + self.width).max(other.x + other.width);
        let bottom = (self.y + self.height).max(other.y + other.height);
        Rect::new(x, y, right - x, bottom - y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lerp_is_unclamped() {
        let a = Position::new(0.0, 0.0);
        let b = Position::new(10.0, 0.0);
        assert_eq!(a.lerp(b, 0.5), Position::new(5.0, 0.0));
        assert_eq!(a.lerp(b, 1.5), Position::new(15.0, 0.0));
        assert_eq!(a.lerp(b, -0.5), Position::new(-5.0, 0.0));
    }

    #[test]
    fn scale_about_pivot() {
        let p = Position::new(4.0, 6.0);
        let pivot = Position::new(2.0, 2.0);
        assert_eq!(p.scaled_about(pivot, 2.0, 1.0), Position::new(6.0, 6.0));
        assert_eq!(p.scaled_about(pivot, 1.0, 1.0), p);
    }

    #[test]
    fn rect_from_corners_normalizes() {
        let r = Rect::from_corners(Position::new(10.0, 10.0), Position::new(2.0, 4.0));
        assert_eq!(r, Rect::new(2.0, 4.0, 8.0, 6.0));
    }
}
