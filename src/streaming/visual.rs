//! Visual representation capability
//!
//! The cache never builds geometry itself. It asks a `VisualBackend` to
//! materialize a handle for each cached region, to (re)populate it from the
//! region's content, and to destroy it on eviction. Handles are moved into
//! `destroy`, so a handle cannot be destroyed twice or shared between two
//! cached blocks.

use std::collections::HashSet;

use glam::Vec3;

use crate::world::RegionBlock;

/// What kind of visual element to build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisualKind {
    /// The empty base object a cached region hangs its content off
    RegionBase,
    /// One placed brick
    Brick,
}

/// Externally fulfilled visual lifecycle
pub trait VisualBackend {
    type Handle;

    fn materialize(&mut self, kind: VisualKind, at: Vec3) -> Self::Handle;

    /// Rebuild the content under `target` from `region`, replacing whatever
    /// was there before.
    fn populate(&mut self, kind: VisualKind, target: &mut Self::Handle, region: &RegionBlock);

    fn destroy(&mut self, handle: Self::Handle);
}

/// Handle produced by `HeadlessBackend`
#[derive(Debug, PartialEq)]
pub struct HeadlessHandle {
    id: u64,
    position: Vec3,
    children: usize,
    builds: u32,
}

impl HeadlessHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Number of elements built by the last populate
    pub fn children(&self) -> usize {
        self.children
    }

    /// How many times this handle has been populated
    pub fn builds(&self) -> u32 {
        self.builds
    }
}

/// Visual backend that keeps no geometry, only bookkeeping.
///
/// Used by servers, tools and tests that drive the cache without a renderer.
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    next_id: u64,
    live: HashSet<u64>,
    destroyed: Vec<u64>,
    materialized: u64,
    populated: u64,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn materialized(&self) -> u64 {
        self.materialized
    }

    pub fn populated(&self) -> u64 {
        self.populated
    }

    /// Ids in destruction order
    pub fn destroyed(&self) -> &[u64] {
        &self.destroyed
    }

    pub fn live_handles(&self) -> usize {
        self.live.len()
    }

    pub fn is_live(&self, id: u64) -> bool {
        self.live.contains(&id)
    }
}

impl VisualBackend for HeadlessBackend {
    type Handle = HeadlessHandle;

    fn materialize(&mut self, kind: VisualKind, at: Vec3) -> HeadlessHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.materialized += 1;
        self.live.insert(id);
        log::trace!("Materialized {:?} #{} at {:?}", kind, id, at);

        HeadlessHandle {
            id,
            position: at,
            children: 0,
            builds: 0,
        }
    }

    fn populate(&mut self, kind: VisualKind, target: &mut HeadlessHandle, region: &RegionBlock) {
        self.populated += 1;
        target.children = region.bricks().len();
        target.builds += 1;
        log::trace!(
            "Populated #{} with {} {:?} element(s)",
            target.id,
            target.children,
            kind
        );
    }

    fn destroy(&mut self, handle: HeadlessHandle) {
        if !self.live.remove(&handle.id) {
            log::warn!("Destroyed visual #{} which was not live", handle.id);
        }
        self.destroyed.push(handle.id);
    }
}
