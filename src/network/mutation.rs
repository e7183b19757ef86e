//! Block placement intents
//!
//! `place_block` is a one-way notification. The server's authoritative
//! update comes back later through the normal sync path with a bumped
//! version.

use glam::{Vec2, Vec3};

use super::connection::Connection;
use super::packet::{BlockMutation, Message};
use crate::streaming::{CachedBlockId, LocalCache, VisualBackend};

/// Optional local preview of a placement before the server confirms it.
///
/// `offset` is relative to the covering block's anchor.
pub trait LocalMutation {
    fn apply_local_mutation(&mut self, block: CachedBlockId, offset: Vec2);
}

/// Local mutation that does nothing; the server round trip does all the work
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLocalMutation;

impl LocalMutation for NoLocalMutation {
    fn apply_local_mutation(&mut self, _block: CachedBlockId, _offset: Vec2) {}
}

impl<F> LocalMutation for F
where
    F: FnMut(CachedBlockId, Vec2),
{
    fn apply_local_mutation(&mut self, block: CachedBlockId, offset: Vec2) {
        self(block, offset)
    }
}

/// Where a placement landed in the local cache
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Placement {
    Cached { block: CachedBlockId, offset: Vec2 },
    Uncached,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MutationStats {
    pub sent: u64,
    pub send_failures: u64,
    pub lookup_misses: u64,
}

/// Sends block mutation intents to the server
#[derive(Debug)]
pub struct MutationClient<C: Connection, A: LocalMutation = NoLocalMutation> {
    connection: C,
    local: A,
    stats: MutationStats,
}

impl<C: Connection> MutationClient<C> {
    pub fn new(connection: C) -> Self {
        Self::with_local_mutation(connection, NoLocalMutation)
    }
}

impl<C: Connection, A: LocalMutation> MutationClient<C, A> {
    pub fn with_local_mutation(connection: C, local: A) -> Self {
        Self {
            connection,
            local,
            stats: MutationStats::default(),
        }
    }

    pub fn stats(&self) -> MutationStats {
        self.stats
    }

    /// Ask the server to add content at `(x, z)`.
    ///
    /// Exactly one `BlockMutation` is handed to the connection whether or
    /// not a cached block covers the point.
    pub fn place_block<B: VisualBackend>(&mut self, cache: &LocalCache<B>, x: f32, z: f32) -> Placement {
        let point = Vec3::new(x, 0.0, z);

        let placement = match cache.find_block(point) {
            Some(block) => {
                let offset = block.region().local_offset(x, z);
                self.local.apply_local_mutation(block.id(), offset);
                Placement::Cached {
                    block: block.id(),
                    offset,
                }
            }
            None => {
                log::warn!("No level block at {:?}", point);
                self.stats.lookup_misses += 1;
                Placement::Uncached
            }
        };

        match self.connection.send(Message::LevelUpdate(BlockMutation { x, z })) {
            Ok(()) => self.stats.sent += 1,
            Err(e) => {
                log::warn!("Failed to send block mutation: {}", e);
                self.stats.send_failures += 1;
            }
        }

        placement
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::connection::QueuedConnection;
    use crate::network::protocol::MAX_PACKET_SIZE;
    use crate::streaming::HeadlessBackend;
    use crate::world::{RegionBlock, RegionExtent};

    #[test]
    fn test_sends_even_without_cached_block() {
        let cache = LocalCache::new(HeadlessBackend::new());
        let connection = QueuedConnection::new(MAX_PACKET_SIZE);
        let mut client = MutationClient::new(&connection);

        assert_eq!(client.place_block(&cache, 3.0, 4.0), Placement::Uncached);

        let frames = connection.drain_outgoing();
        assert_eq!(frames.len(), 1);
        assert_eq!(
            frames[0].decode(MAX_PACKET_SIZE).unwrap(),
            Message::LevelUpdate(BlockMutation { x: 3.0, z: 4.0 })
        );
        assert_eq!(client.stats().lookup_misses, 1);
    }

    #[test]
    fn test_cached_placement_computes_local_offset() {
        let mut cache = LocalCache::new(HeadlessBackend::new());
        let id = cache
            .reconcile(RegionBlock::new(RegionExtent::square(10.0, 20.0, 10.0)).with_version(1))
            .id()
            .unwrap();

        let connection = QueuedConnection::new(MAX_PACKET_SIZE);
        let mut previews = Vec::new();
        let mut client = MutationClient::with_local_mutation(&connection, |block: CachedBlockId, offset: Vec2| {
            previews.push((block, offset));
        });

        let placement = client.place_block(&cache, 13.0, 27.0);
        assert_eq!(
            placement,
            Placement::Cached {
                block: id,
                offset: Vec2::new(3.0, 7.0)
            }
        );
        assert_eq!(client.stats().sent, 1);
        drop(client);

        assert_eq!(previews, vec![(id, Vec2::new(3.0, 7.0))]);
        assert_eq!(connection.pending(), 1);
        // The cache itself is untouched until the server answers
        assert!(cache.find_block(Vec3::new(13.0, 0.0, 27.0)).unwrap().region().bricks().is_empty());
    }
}
