pub mod region_block;

pub use region_block::{Brick, RegionBlock, RegionExtent};
