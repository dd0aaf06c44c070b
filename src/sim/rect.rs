//! Axis-aligned rectangles
//!
//! Every collision in the arena is rectangle vs rectangle: tanks use a fixed
//! footprint regardless of hull angle, and bullets, missiles and power-ups use
//! the square around their radius.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Rectangle stored as top-left corner plus size
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Rectangle of the given size centred on `center`
    pub fn centered(center: Vec2, w: f32, h: f32) -> Self {
        Self::new(center.x - w / 2.0, center.y - h / 2.0, w, h)
    }

    /// Square enclosing a circle
    pub fn around(center: Vec2, radius: f32) -> Self {
        Self::centered(center, radius * 2.0, radius * 2.0)
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    /// Strict overlap test (touching edges do not count)
    #[inline]
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }

    /// Grow by `margin` on every side
    pub fn inflate(&self, margin: f32) -> Rect {
        Rect::new(
            self.x - margin,
            self.y - margin,
            self.w + margin * 2.0,
            self.h + margin * 2.0,
        )
    }

    /// Overlap depth along each axis, `None` when disjoint
    pub fn penetration(&self, other: &Rect) -> Option<Vec2> {
        if !self.overlaps(other) {
            return None;
        }
        let x = (self.right() - other.x).min(other.right() - self.x);
        let y = (self.bottom() - other.y).min(other.bottom() - self.y);
        Some(Vec2::new(x, y))
    }
}

/// Which face of a rectangle a moving body struck
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitAxis {
    /// Left or right face, flip the horizontal velocity
    Vertical,
    /// Top or bottom face, flip the vertical velocity
    Horizontal,
}

/// Pick the struck face from the shallower penetration axis
pub fn hit_axis(body: &Rect, wall: &Rect) -> Option<HitAxis> {
    body.penetration(wall).map(|depth| {
        if depth.x < depth.y {
            HitAxis::Vertical
        } else {
            HitAxis::Horizontal
        }
    })
}

/// Mirror a velocity off the struck face
pub fn reflect_velocity(velocity: Vec2, axis: HitAxis) -> Vec2 {
    match axis {
        HitAxis::Vertical => Vec2::new(-velocity.x, velocity.y),
        HitAxis::Horizontal => Vec2::new(velocity.x, -velocity.y),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlap() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(a.overlaps(&Rect::new(5.0, 5.0, 10.0, 10.0)));
        assert!(!a.overlaps(&Rect::new(20.0, 0.0, 5.0, 5.0)));
        // Touching edges are not an overlap
        assert!(!a.overlaps(&Rect::new(10.0, 0.0, 5.0, 5.0)));
    }

    #[test]
    fn test_centered() {
        let r = Rect::centered(Vec2::new(100.0, 50.0), 30.0, 20.0);
        assert_eq!(r, Rect::new(85.0, 40.0, 30.0, 20.0));
        assert_eq!(r.center(), Vec2::new(100.0, 50.0));
    }

    #[test]
    fn test_hit_axis_side_face() {
        // Bullet poking 2px into the left face of a tall wall
        let wall = Rect::new(100.0, 0.0, 20.0, 100.0);
        let bullet = Rect::around(Vec2::new(99.0, 50.0), 3.0);
        assert_eq!(hit_axis(&bullet, &wall), Some(HitAxis::Vertical));
    }

    #[test]
    fn test_hit_axis_top_face() {
        let wall = Rect::new(0.0, 100.0, 100.0, 20.0);
        let bullet = Rect::around(Vec2::new(50.0, 99.0), 3.0);
        assert_eq!(hit_axis(&bullet, &wall), Some(HitAxis::Horizontal));
    }

    #[test]
    fn test_hit_axis_miss() {
        let wall = Rect::new(0.0, 0.0, 10.0, 10.0);
        let bullet = Rect::around(Vec2::new(50.0, 50.0), 3.0);
        assert_eq!(hit_axis(&bullet, &wall), None);
    }

    #[test]
    fn test_reflect_velocity() {
        let v = Vec2::new(100.0, -40.0);
        assert_eq!(reflect_velocity(v, HitAxis::Vertical), Vec2::new(-100.0, -40.0));
        assert_eq!(reflect_velocity(v, HitAxis::Horizontal), Vec2::new(100.0, 40.0));
    }

    #[test]
    fn test_inflate_and_contains() {
        let r = Rect::new(10.0, 10.0, 10.0, 10.0).inflate(5.0);
        assert!(r.contains(Vec2::new(6.0, 6.0)));
        assert!(!r.contains(Vec2::new(4.0, 6.0)));
    }
}
