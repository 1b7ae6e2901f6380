//! 2D vector math shared by entities and spatial indexes.

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Mul, Neg, Sub};

/// A point or displacement in world space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Vector with both components set to `v`
    #[inline]
    pub const fn splat(v: f32) -> Self {
        Self { x: v, y: v }
    }

    #[inline]
    pub fn length_squared(self) -> f32 {
        self.x * self.x + self.y * self.y
    }

    #[inline]
    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    #[inline]
    pub fn distance_squared(self, other: Vec2) -> f32 {
        (self - other).length_squared()
    }

    #[inline]
    pub fn distance(self, other: Vec2) -> f32 {
        self.distance_squared(other).sqrt()
    }

    /// Whether `other` lies within `range` of this point (inclusive).
    ///
    /// Every index implementation filters with this predicate so that they
    /// agree bit-for-bit on boundary cases.
    #[inline]
    pub fn within(self, other: Vec2, range: f32) -> bool {
        range >= 0.0 && self.distance_squared(other) <= range * range
    }

    #[inline]
    pub fn is_zero(self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }

    /// Scale down so the length does not exceed `max`. Shorter vectors are
    /// returned unchanged.
    pub fn clamp_length(self, max: f32) -> Self {
        let max = max.max(0.0);
        let len = self.length();
        if len > max && len > 0.0 {
            self * (max / len)
        } else {
            self
        }
    }

    /// Component-wise clamp into `[min, max]`
    #[inline]
    pub fn clamp(self, min: Vec2, max: Vec2) -> Self {
        Self {
            x: self.x.max(min.x).min(max.x),
            y: self.y.max(min.y).min(max.y),
        }
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f32, f32)> for Vec2 {
    fn from((x, y): (f32, f32)) -> Self {
        Self { x, y }
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    #[inline]
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    #[inline]
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    #[inline]
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;

    #[inline]
    fn mul(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Vec2 {
    type Output = Vec2;

    #[inline]
    fn neg(self) -> Vec2 {
        Vec2::new(-self.x, -self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_and_distance() {
        let a = Vec2::new(3.0, 4.0);
        assert_eq!(a.length(), 5.0);
        assert_eq!(Vec2::ZERO.distance(a), 5.0);
    }

    #[test]
    fn test_within_is_inclusive() {
        let a = Vec2::new(100.0, 100.0);
        assert!(a.within(Vec2::new(105.0, 100.0), 5.0));
        assert!(!a.within(Vec2::new(105.0, 100.0), 4.99));
        assert!(a.within(a, 0.0));
        assert!(!a.within(a, -1.0));
    }

    #[test]
    fn test_clamp_length() {
        let v = Vec2::new(30.0, 40.0).clamp_length(5.0);
        assert!((v.length() - 5.0).abs() < 1e-5);
        assert!((v.x - 3.0).abs() < 1e-5);

        let short = Vec2::new(1.0, 1.0);
        assert_eq!(short.clamp_length(5.0), short);
        assert!(Vec2::new(1.0, 2.0).clamp_length(0.0).is_zero());
    }

    #[test]
    fn test_clamp_components() {
        let v = Vec2::new(-3.0, 120.0).clamp(Vec2::ZERO, Vec2::new(100.0, 100.0));
        assert_eq!(v, Vec2::new(0.0, 100.0));
    }
}
