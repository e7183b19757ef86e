//! Region blocks: versioned, spatially bounded chunks of world content.
//!
//! All extents live on the X/Z ground plane. A `Vec2` here always means
//! `(x, z)`; the `y` component of the `Vec2` carries world Z.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle on the ground plane
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegionExtent {
    pub origin: Vec2,
    pub size: Vec2,
}

impl RegionExtent {
    pub fn new(origin: Vec2, size: Vec2) -> Self {
        Self { origin, size }
    }

    /// Square extent with its minimum corner at `(x, z)`
    pub fn square(x: f32, z: f32, size: f32) -> Self {
        Self::new(Vec2::new(x, z), Vec2::splat(size))
    }

    pub fn min(&self) -> Vec2 {
        self.origin
    }

    pub fn max(&self) -> Vec2 {
        self.origin + self.size
    }

    /// Finite, and still non-empty once `origin + size` is rounded to f32.
    /// An invalid extent contains no point at all.
    pub fn is_valid(&self) -> bool {
        let max = self.max();
        self.origin.is_finite() && max.is_finite() && max.x > self.origin.x && max.y > self.origin.y
    }

    /// Half-open containment: the minimum edges are inside, the maximum edges
    /// belong to the neighbouring region.
    pub fn contains(&self, x: f32, z: f32) -> bool {
        self.contains_with_margin(x, z, 0.0)
    }

    /// Containment against the extent inflated by `margin` on every side
    pub fn contains_with_margin(&self, x: f32, z: f32, margin: f32) -> bool {
        let min = self.min() - Vec2::splat(margin);
        let max = self.max() + Vec2::splat(margin);
        x >= min.x && x < max.x && z >= min.y && z < max.y
    }
}

/// A single piece of placed content, stored relative to its region's origin
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Brick {
    pub offset: Vec2,
}

/// Authoritative chunk of world state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionBlock {
    extent: RegionExtent,
    /// Bumped on every content change
    version: u64,
    bricks: Vec<Brick>,
}

impl RegionBlock {
    /// Empty region at version 0
    pub fn new(extent: RegionExtent) -> Self {
        Self {
            extent,
            version: 0,
            bricks: Vec::new(),
        }
    }

    pub fn with_version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }

    pub fn extent(&self) -> &RegionExtent {
        &self.extent
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn bricks(&self) -> &[Brick] {
        &self.bricks
    }

    /// Anchor coordinates on the ground plane
    pub fn position(&self) -> Vec2 {
        self.extent.origin
    }

    /// Anchor lifted into world space at ground level
    pub fn anchor(&self) -> Vec3 {
        let p = self.position();
        Vec3::new(p.x, 0.0, p.y)
    }

    pub fn contains(&self, x: f32, z: f32) -> bool {
        self.extent.contains(x, z)
    }

    pub fn contains_with_margin(&self, x: f32, z: f32, margin: f32) -> bool {
        self.extent.contains_with_margin(x, z, margin)
    }

    /// World ground coordinates expressed relative to this region's anchor
    pub fn local_offset(&self, x: f32, z: f32) -> Vec2 {
        Vec2::new(x, z) - self.position()
    }

    /// Add a brick at a block-local offset. Returns the new version.
    pub fn add_brick(&mut self, offset: Vec2) -> u64 {
        self.bricks.push(Brick { offset });
        self.version += 1;
        self.version
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_half_open_containment() {
        let extent = RegionExtent::square(0.0, 0.0, 10.0);
        assert!(extent.contains(0.0, 0.0));
        assert!(extent.contains(9.99, 5.0));
        assert!(!extent.contains(10.0, 5.0));
        assert!(!extent.contains(5.0, -0.01));
    }

    #[test]
    fn test_margin_inflates_all_sides() {
        let extent = RegionExtent::square(20.0, 0.0, 10.0);
        assert!(!extent.contains_with_margin(0.0, 0.0, 15.0));
        assert!(extent.contains_with_margin(5.0, 0.0, 15.0));
        assert!(extent.contains_with_margin(44.0, -14.0, 15.0));
    }

    #[test]
    fn test_degenerate_extents_are_invalid() {
        assert!(RegionExtent::square(-10.0, 30.0, 10.0).is_valid());
        assert!(!RegionExtent::new(Vec2::ZERO, Vec2::ZERO).is_valid());
        assert!(!RegionExtent::new(Vec2::ZERO, Vec2::new(10.0, -1.0)).is_valid());
        assert!(!RegionExtent::square(f32::NAN, 0.0, 10.0).is_valid());
        assert!(!RegionExtent::square(0.0, 0.0, f32::INFINITY).is_valid());

        // Far from the origin a 10 unit region rounds away to nothing
        let far = RegionExtent::square(3e8, 0.0, 10.0);
        assert_eq!(far.max().x, far.min().x);
        assert!(!far.is_valid());
        assert!(!far.contains(3e8, 5.0));
    }

    #[test]
    fn test_add_brick_bumps_version() {
        let mut block = RegionBlock::new(RegionExtent::square(10.0, 20.0, 10.0)).with_version(3);
        let offset = block.local_offset(12.0, 25.0);
        assert_eq!(offset, Vec2::new(2.0, 5.0));

        assert_eq!(block.add_brick(offset), 4);
        assert_eq!(block.version(), 4);
        assert_eq!(block.bricks(), &[Brick { offset }]);
    }

    #[test]
    fn test_anchor_is_on_ground() {
        let block = RegionBlock::new(RegionExtent::square(-10.0, 30.0, 10.0));
        assert_eq!(block.anchor(), Vec3::new(-10.0, 0.0, 30.0));
    }
}
