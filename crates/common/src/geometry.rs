//! Geometric primitives.

use serde::{Deserialize, Serialize};

/// A 2D point in CSS pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle in CSS pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const ZERO: Rect = Rect { x: 0.0, y: 0.0, width: 0.0, height: 0.0 };

    #[inline]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    #[inline]
    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    #[inline]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    #[inline]
    pub fn translate(&self, dx: f32, dy: f32) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Offset this rectangle so that `origin` becomes (0, 0).
    #[inline]
    pub fn relative_to(&self, origin: Point) -> Rect {
        self.translate(-origin.x, -origin.y)
    }

    /// Approximate equality, tolerant of float noise from interpolation.
    pub fn approx_eq(&self, other: &Rect, epsilon: f32) -> bool {
        (self.x - other.x).abs() <= epsilon
            && (self.y - other.y).abs() <= epsilon
            && (self.width - other.width).abs() <= epsilon
            && (self.height - other.height).abs() <= epsilon
    }
}

/// A scale followed by a translation: `p' = p * scale + offset`.
///
/// Enough for the `translate*()`/`scale()` functions the DOM understands.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub scale_x: f32,
    pub scale_y: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        scale_x: 1.0,
        scale_y: 1.0,
        offset_x: 0.0,
        offset_y: 0.0,
    };

    pub const fn translation(x: f32, y: f32) -> Self {
        Self { offset_x: x, offset_y: y, ..Self::IDENTITY }
    }

    pub const fn scale(sx: f32, sy: f32) -> Self {
        Self { scale_x: sx, scale_y: sy, ..Self::IDENTITY }
    }

    /// `self` applied first, then `next`.
    pub fn then(&self, next: &Transform) -> Transform {
        Transform {
            scale_x: self.scale_x * next.scale_x,
            scale_y: self.scale_y * next.scale_y,
            offset_x: self.offset_x * next.scale_x + next.offset_x,
            offset_y: self.offset_y * next.scale_y + next.offset_y,
        }
    }

    /// Re-anchor this transform so it applies around `origin` instead of (0, 0).
    pub fn around(&self, origin: Point) -> Transform {
        Transform::translation(-origin.x, -origin.y)
            .then(self)
            .then(&Transform::translation(origin.x, origin.y))
    }

    pub fn apply(&self, point: Point) -> Point {
        Point::new(
            point.x * self.scale_x + self.offset_x,
            point.y * self.scale_y + self.offset_y,
        )
    }

    /// Bounding box of `rect` after the transform; negative scales flip it.
    pub fn transform_rect(&self, rect: Rect) -> Rect {
        let a = self.apply(rect.origin());
        let b = self.apply(Point::new(rect.right(), rect.bottom()));
        Rect::new(a.x.min(b.x), a.y.min(b.y), (b.x - a.x).abs(), (b.y - a.y).abs())
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_edges() {
        let rect = Rect::new(10.0, 20.0, 30.0, 40.0);
        assert_eq!(rect.right(), 40.0);
        assert_eq!(rect.bottom(), 60.0);
        assert_eq!(rect.center(), Point::new(25.0, 40.0));
    }

    #[test]
    fn test_relative_to() {
        let rect = Rect::new(110.0, 220.0, 30.0, 40.0);
        let local = rect.relative_to(Point::new(100.0, 200.0));
        assert_eq!(local, Rect::new(10.0, 20.0, 30.0, 40.0));
    }

    #[test]
    fn test_translation_rect() {
        let t = Transform::translation(5.0, -5.0);
        let rect = t.transform_rect(Rect::new(0.0, 10.0, 20.0, 20.0));
        assert!(rect.approx_eq(&Rect::new(5.0, 5.0, 20.0, 20.0), 0.001));
    }

    #[test]
    fn test_scale_around_center() {
        let rect = Rect::new(0.0, 0.0, 100.0, 50.0);
        let t = Transform::scale(2.0, 2.0).around(rect.center());
        let scaled = t.transform_rect(rect);
        assert!(scaled.approx_eq(&Rect::new(-50.0, -25.0, 200.0, 100.0), 0.001));
    }

    #[test]
    fn test_then_order() {
        // Scale first, then move: the offset is not scaled
        let t = Transform::scale(2.0, 2.0).then(&Transform::translation(10.0, 0.0));
        assert_eq!(t.apply(Point::new(1.0, 1.0)), Point::new(12.0, 2.0));

        let flipped = Transform::scale(-1.0, 1.0).transform_rect(Rect::new(10.0, 0.0, 20.0, 5.0));
        assert_eq!(flipped, Rect::new(-30.0, 0.0, 20.0, 5.0));
    }
}
