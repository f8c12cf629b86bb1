use glamx::{Vec2, Vec4};
use std::ops::Mul;

/// Axis aligned rectangle in pixels, origin at the top left.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Mul<f32> for Rect {
    type Output = Rect;

    fn mul(self, rhs: f32) -> Self::Output {
        Rect {
            x: self.x * rhs,
            y: self.y * rhs,
            width: self.width * rhs,
            height: self.height * rhs,
        }
    }
}

impl Rect {
    pub const ZERO: Rect = Rect::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub const fn from_size(width: f32, height: f32) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    /// True when both rectangles share a region of non-zero area. Touching edges don't count.
    pub fn overlaps(&self, other: &Rect) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }

        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Bounds as `(x, y, width, height)` divided by the given extent, i.e. in UV space.
    pub fn normalized(&self, width: f32, height: f32) -> Vec4 {
        if width <= 0.0 || height <= 0.0 {
            return Vec4::ZERO;
        }

        Vec4::new(
            self.x / width,
            self.y / height,
            self.width / width,
            self.height / height,
        )
    }

    pub fn to_vec4(&self) -> Vec4 {
        Vec4::new(self.x, self.y, self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touching_rects_dont_overlap() {
        let a = Rect::new(0.0, 0.0, 256.0, 256.0);
        let b = Rect::new(256.0, 0.0, 256.0, 256.0);
        let c = Rect::new(128.0, 128.0, 256.0, 256.0);

        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
        assert!(b.overlaps(&c));
        assert!(!a.overlaps(&Rect::ZERO));
    }

    #[test]
    fn containment() {
        let atlas = Rect::from_size(1024.0, 1024.0);

        assert!(atlas.contains_rect(&Rect::new(768.0, 0.0, 256.0, 256.0)));
        assert!(!atlas.contains_rect(&Rect::new(800.0, 0.0, 256.0, 256.0)));
        assert!(atlas.contains_rect(&atlas));
    }

    #[test]
    fn normalized_bounds() {
        let tile = Rect::new(256.0, 512.0, 256.0, 256.0);
        assert_eq!(
            tile.normalized(1024.0, 1024.0),
            Vec4::new(0.25, 0.5, 0.25, 0.25)
        );
        assert_eq!(tile.normalized(0.0, 1024.0), Vec4::ZERO);
    }
}
