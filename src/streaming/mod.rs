//! Client-side region streaming
//!
//! The local cache of region blocks around the observer, the spatial queries
//! it is built on, and the two collaborator capabilities it consumes: visual
//! materialization and observer tracking.

pub mod local_cache;
pub mod observer;
pub mod spatial_index;
pub mod visual;

pub use local_cache::{CacheStats, CachedBlock, CachedBlockId, LocalCache, Reconciled};
pub use observer::{ObserverProvider, SharedObserver};
pub use spatial_index::{blocks_outside_radius, find_block};
pub use visual::{HeadlessBackend, HeadlessHandle, VisualBackend, VisualKind};
