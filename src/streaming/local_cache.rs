//! Client-side cache of region blocks near the observer
//!
//! Each cached block pairs the best-known copy of a region with the visual
//! handle built for it. Incoming regions go through `reconcile`, which
//! inserts unknown regions and replaces known ones only when the incoming
//! version is strictly newer. `evict` drops everything the observer can no
//! longer see and destroys its visual handle.

use glam::Vec3;

use super::spatial_index;
use super::visual::{VisualBackend, VisualKind};
use crate::error::{StreamError, StreamResult};
use crate::world::RegionBlock;

/// Identity of a cached block, unique for the lifetime of its cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CachedBlockId(pub u64);

/// A region copy together with the visual handle it exclusively owns
#[derive(Debug)]
pub struct CachedBlock<H> {
    id: CachedBlockId,
    region: RegionBlock,
    visual: H,
}

impl<H> CachedBlock<H> {
    pub(crate) fn new(id: CachedBlockId, region: RegionBlock, visual: H) -> Self {
        Self { id, region, visual }
    }

    pub fn id(&self) -> CachedBlockId {
        self.id
    }

    pub fn region(&self) -> &RegionBlock {
        &self.region
    }

    pub fn visual(&self) -> &H {
        &self.visual
    }
}

/// Result of merging one incoming region into the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciled {
    /// No cached block covered the region; a new one was created
    Inserted(CachedBlockId),
    /// The incoming version was newer; region replaced and visual rebuilt
    Updated {
        id: CachedBlockId,
        previous_version: u64,
    },
    /// The incoming version was not newer; nothing changed
    Stale {
        id: CachedBlockId,
        cached_version: u64,
    },
    /// The incoming extent covers no point; nothing was inserted
    Rejected,
}

impl Reconciled {
    /// The cached block the region was merged into, if any
    pub fn id(&self) -> Option<CachedBlockId> {
        match *self {
            Reconciled::Inserted(id) => Some(id),
            Reconciled::Updated { id, .. } => Some(id),
            Reconciled::Stale { id, .. } => Some(id),
            Reconciled::Rejected => None,
        }
    }
}

/// Cache counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub inserted: u64,
    pub updated: u64,
    pub stale_discarded: u64,
    pub rejected: u64,
    pub evicted: u64,
}

/// The set of cached blocks plus the backend that owns their visuals
pub struct LocalCache<B: VisualBackend> {
    blocks: Vec<CachedBlock<B::Handle>>,
    backend: B,
    next_id: u64,
    stats: CacheStats,
}

impl<B: VisualBackend> LocalCache<B> {
    pub fn new(backend: B) -> Self {
        Self {
            blocks: Vec::new(),
            backend,
            next_id: 0,
            stats: CacheStats::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Blocks in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &CachedBlock<B::Handle>> {
        self.blocks.iter()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// The cached block covering `point`, if any. A miss is a normal result.
    pub fn find_block(&self, point: Vec3) -> Option<&CachedBlock<B::Handle>> {
        spatial_index::find_block(&self.blocks, point).map(|index| &self.blocks[index])
    }

    pub fn get(&self, id: CachedBlockId) -> Option<&CachedBlock<B::Handle>> {
        self.blocks.iter().find(|block| block.id == id)
    }

    /// Create a cached block for `region` with a fresh visual at `anchor`.
    ///
    /// Fails with `DuplicateRegion` if a cached block already covers
    /// `anchor`, and with `InvalidRegion` if the region's extent covers no
    /// point. The visual is materialized but not populated.
    pub fn insert(&mut self, region: RegionBlock, anchor: Vec3) -> StreamResult<&CachedBlock<B::Handle>> {
        if !region.extent().is_valid() {
            return Err(StreamError::InvalidRegion {
                x: anchor.x,
                z: anchor.z,
            });
        }
        if self.find_block(anchor).is_some() {
            return Err(StreamError::DuplicateRegion {
                x: anchor.x,
                z: anchor.z,
            });
        }
        let index = self.insert_unchecked(region, anchor);
        Ok(&self.blocks[index])
    }

    fn insert_unchecked(&mut self, region: RegionBlock, anchor: Vec3) -> usize {
        log::debug!("New local block at {:?} (version {})", anchor, region.version());

        let id = CachedBlockId(self.next_id);
        self.next_id += 1;

        let visual = self.backend.materialize(VisualKind::RegionBase, anchor);
        self.blocks.push(CachedBlock::new(id, region, visual));
        self.stats.inserted += 1;
        self.blocks.len() - 1
    }

    /// Merge an incoming region into the cache.
    ///
    /// Lookup is by the region's anchor. Unknown regions are inserted and
    /// populated; known regions are replaced and fully rebuilt only when the
    /// incoming version is strictly greater. Equal or older versions are
    /// discarded, which makes duplicate responses harmless. Regions with an
    /// empty or non-finite extent can never be found again and are rejected.
    pub fn reconcile(&mut self, incoming: RegionBlock) -> Reconciled {
        let anchor = incoming.anchor();

        if !incoming.extent().is_valid() {
            log::warn!("Rejecting region with empty extent {:?}", incoming.extent());
            self.stats.rejected += 1;
            return Reconciled::Rejected;
        }

        match spatial_index::find_block(&self.blocks, anchor) {
            None => {
                let index = self.insert_unchecked(incoming, anchor);
                let block = &mut self.blocks[index];
                self.backend
                    .populate(VisualKind::Brick, &mut block.visual, &block.region);
                Reconciled::Inserted(block.id)
            }
            Some(index) => {
                let block = &mut self.blocks[index];
                let cached_version = block.region.version();

                if incoming.version() > cached_version {
                    log::debug!(
                        "Updating local block {:?}: version {} -> {}",
                        block.id,
                        cached_version,
                        incoming.version()
                    );
                    block.region = incoming;
                    self.backend
                        .populate(VisualKind::Brick, &mut block.visual, &block.region);
                    self.stats.updated += 1;
                    Reconciled::Updated {
                        id: block.id,
                        previous_version: cached_version,
                    }
                } else {
                    log::trace!(
                        "Discarding stale block {:?}: incoming version {} <= cached {}",
                        block.id,
                        incoming.version(),
                        cached_version
                    );
                    self.stats.stale_discarded += 1;
                    Reconciled::Stale {
                        id: block.id,
                        cached_version,
                    }
                }
            }
        }
    }

    /// Remove every block whose extent, inflated by `view_radius`, does not
    /// contain the observer. Each removed block's visual is destroyed once.
    /// Returns the evicted ids in removal order.
    pub fn evict(&mut self, observer: Vec3, view_radius: f32) -> Vec<CachedBlockId> {
        let outside = spatial_index::blocks_outside_radius(&self.blocks, observer, view_radius);
        let mut evicted = Vec::with_capacity(outside.len());

        // Back to front so earlier indices stay valid
        for index in outside.into_iter().rev() {
            let block = self.blocks.remove(index);
            log::debug!("Evicting local block {:?} at {:?}", block.id, block.region.position());
            self.backend.destroy(block.visual);
            evicted.push(block.id);
        }

        self.stats.evicted += evicted.len() as u64;
        evicted
    }

    /// Evict everything
    pub fn clear(&mut self) {
        for block in self.blocks.drain(..) {
            self.backend.destroy(block.visual);
            self.stats.evicted += 1;
        }
    }
}

impl<B: VisualBackend> Drop for LocalCache<B> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<B: VisualBackend> std::fmt::Debug for LocalCache<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalCache")
            .field("blocks", &self.blocks.len())
            .field("backend", &"<VisualBackend>")
            .field("next_id", &self.next_id)
            .field("stats", &self.stats)
            .finish()
    }
}
