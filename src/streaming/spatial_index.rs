//! Spatial queries over the cached region list
//!
//! Pure functions over a slice of cached blocks. Lookup is a linear scan
//! returning the first match, so overlapping regions resolve to whichever
//! was inserted first. Only X/Z of a point take part in the tests.

use glam::Vec3;

use super::local_cache::CachedBlock;

/// Index of the first cached block whose extent contains `point`
pub fn find_block<H>(blocks: &[CachedBlock<H>], point: Vec3) -> Option<usize> {
    blocks
        .iter()
        .position(|block| block.region().contains(point.x, point.z))
}

/// Indices, ascending, of cached blocks whose extent inflated by `radius`
/// does not contain `point`
pub fn blocks_outside_radius<H>(blocks: &[CachedBlock<H>], point: Vec3, radius: f32) -> Vec<usize> {
    blocks
        .iter()
        .enumerate()
        .filter(|(_, block)| !block.region().contains_with_margin(point.x, point.z, radius))
        .map(|(index, _)| index)
        .collect()
}
