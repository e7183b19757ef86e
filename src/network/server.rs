//! Reference peer for the streaming protocol
//!
//! Holds the authoritative region grid for a single client. Regions are
//! square cells of `region_size` keyed by their grid coordinate and are
//! created empty on first touch. Mutations are last-write-wins: each one
//! adds a brick and bumps the region's version, and the change reaches the
//! client through its next sync request.

use std::collections::HashMap;

use glam::Vec2;

use super::connection::Connection;
use super::error::NetworkResult;
use super::packet::{BlockMutation, LevelSyncRequest, LevelSyncResponse, Message, Packet};
use crate::config::ServerConfig;
use crate::world::{RegionBlock, RegionExtent};

/// Grid coordinate of a region on the ground plane
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, PartialOrd, Ord)]
pub struct RegionCoord {
    pub x: i32,
    pub z: i32,
}

impl RegionCoord {
    /// Region containing the ground point `(x, z)`
    pub fn from_ground(x: f32, z: f32, region_size: f32) -> Self {
        Self {
            x: (x / region_size).floor() as i32,
            z: (z / region_size).floor() as i32,
        }
    }

    pub fn extent(&self, region_size: f32) -> RegionExtent {
        RegionExtent::square(self.x as f32 * region_size, self.z as f32 * region_size, region_size)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServerStats {
    pub requests_handled: u64,
    pub responses_sent: u64,
    pub mutations_applied: u64,
    pub rejected_packets: u64,
    pub clamped_requests: u64,
}

/// Authoritative region store answering sync requests and mutations
#[derive(Debug)]
pub struct RegionServer {
    config: ServerConfig,
    regions: HashMap<RegionCoord, RegionBlock>,
    stats: ServerStats,
}

impl RegionServer {
    pub fn new(config: ServerConfig) -> NetworkResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            regions: HashMap::new(),
            stats: ServerStats::default(),
        })
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn stats(&self) -> ServerStats {
        self.stats
    }

    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    /// The region covering `(x, z)`, if it has been created
    pub fn region_at(&self, x: f32, z: f32) -> Option<&RegionBlock> {
        self.regions
            .get(&RegionCoord::from_ground(x, z, self.config.region_size))
    }

    fn region_mut(&mut self, coord: RegionCoord) -> &mut RegionBlock {
        let size = self.config.region_size;
        self.regions
            .entry(coord)
            .or_insert_with(|| RegionBlock::new(coord.extent(size)))
    }

    /// Entry point for frames from the client. Replies go out on `reply`.
    pub fn handle_packet(&mut self, packet: &Packet, reply: &impl Connection) {
        match packet.decode(self.config.max_packet_size) {
            Ok(Message::LevelRequest(request)) => {
                for response in self.handle_sync_request(&request) {
                    match reply.send(Message::LevelResponse(response)) {
                        Ok(()) => self.stats.responses_sent += 1,
                        Err(e) => log::warn!("Failed to send level response: {}", e),
                    }
                }
            }
            Ok(Message::LevelUpdate(mutation)) => {
                self.handle_mutation(mutation);
            }
            Ok(other) => {
                log::warn!("Unexpected message type {:?} on server", other.kind());
                self.stats.rejected_packets += 1;
            }
            Err(e) => {
                log::warn!("Dropping packet of kind {}: {}", packet.kind, e);
                self.stats.rejected_packets += 1;
            }
        }
    }

    /// Regions whose extent, inflated by the request radius, contains the
    /// observer; nearest first, at most `max_blocks_per_response`.
    ///
    /// The radius is capped at `max_view_radius`, which bounds the number of
    /// grid cells walked per request. Cells too far out for f32 to give them
    /// a non-empty extent are skipped.
    pub fn handle_sync_request(&mut self, request: &LevelSyncRequest) -> Vec<LevelSyncResponse> {
        self.stats.requests_handled += 1;

        let size = self.config.region_size;
        let observer = request.observer_position;
        let mut radius = request.view_radius;
        if radius > self.config.max_view_radius {
            log::debug!(
                "Clamping view radius {} to {}",
                radius,
                self.config.max_view_radius
            );
            radius = self.config.max_view_radius;
            self.stats.clamped_requests += 1;
        }
        let min = RegionCoord::from_ground(observer.x - radius, observer.z - radius, size);
        let max = RegionCoord::from_ground(observer.x + radius, observer.z + radius, size);

        let mut visible: Vec<(f32, RegionCoord)> = Vec::new();
        for x in min.x..=max.x {
            for z in min.z..=max.z {
                let coord = RegionCoord { x, z };
                let extent = coord.extent(size);
                if extent.is_valid() && extent.contains_with_margin(observer.x, observer.z, radius) {
                    let center = extent.origin + extent.size * 0.5;
                    let distance = center.distance_squared(Vec2::new(observer.x, observer.z));
                    visible.push((distance, coord));
                }
            }
        }
        visible.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        visible.truncate(self.config.max_blocks_per_response);

        visible
            .into_iter()
            .map(|(_, coord)| LevelSyncResponse {
                region_block: self.region_mut(coord).clone(),
            })
            .collect()
    }

    /// Apply a placement. Returns the region's new version, or `None` for
    /// coordinates with no usable region under them.
    pub fn handle_mutation(&mut self, mutation: BlockMutation) -> Option<u64> {
        let coord = RegionCoord::from_ground(mutation.x, mutation.z, self.config.region_size);
        let usable = mutation.x.is_finite()
            && mutation.z.is_finite()
            && coord.extent(self.config.region_size).is_valid();
        if !usable {
            log::warn!("Ignoring block mutation at ({}, {})", mutation.x, mutation.z);
            self.stats.rejected_packets += 1;
            return None;
        }

        let region = self.region_mut(coord);
        let offset = region.local_offset(mutation.x, mutation.z);
        let version = region.add_brick(offset);
        log::debug!("Added brick to region {:?}, now version {}", coord, version);

        self.stats.mutations_applied += 1;
        Some(version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::connection::QueuedConnection;
    use crate::network::protocol::MAX_PACKET_SIZE;
    use glam::Vec3;

    fn server() -> RegionServer {
        RegionServer::new(ServerConfig::default()).unwrap()
    }

    #[test]
    fn test_region_coord() {
        assert_eq!(RegionCoord::from_ground(5.0, 5.0, 10.0), RegionCoord { x: 0, z: 0 });
        assert_eq!(RegionCoord::from_ground(-0.5, 19.9, 10.0), RegionCoord { x: -1, z: 1 });
        assert_eq!(
            RegionCoord { x: -1, z: 2 }.extent(10.0),
            RegionExtent::square(-10.0, 20.0, 10.0)
        );
    }

    #[test]
    fn test_sync_request_returns_nearest_first() {
        let mut server = server();
        let responses = server.handle_sync_request(&LevelSyncRequest {
            observer_position: Vec3::new(5.0, 0.0, 5.0),
            view_radius: 15.0,
        });

        // Regions -1..=2 on both axes touch the inflated square around (5, 5)
        assert_eq!(responses.len(), 16);
        assert_eq!(
            responses[0].region_block.extent(),
            &RegionExtent::square(0.0, 0.0, 10.0)
        );
        assert!(responses
            .iter()
            .all(|r| r.region_block.contains_with_margin(5.0, 5.0, 15.0)));
        assert_eq!(server.region_count(), 16);
    }

    #[test]
    fn test_response_cap() {
        let mut server = RegionServer::new(ServerConfig {
            max_blocks_per_response: 3,
            ..Default::default()
        })
        .unwrap();
        let responses = server.handle_sync_request(&LevelSyncRequest {
            observer_position: Vec3::ZERO,
            view_radius: 50.0,
        });
        assert_eq!(responses.len(), 3);
    }

    #[test]
    fn test_huge_radius_is_clamped() {
        let mut server = server();
        let max_view_radius = server.config().max_view_radius;

        let responses = server.handle_sync_request(&LevelSyncRequest {
            observer_position: Vec3::ZERO,
            view_radius: 1.0e9,
        });
        assert_eq!(responses.len(), server.config().max_blocks_per_response);
        assert!(responses
            .iter()
            .all(|r| r.region_block.contains_with_margin(0.0, 0.0, max_view_radius)));
        assert_eq!(server.stats().clamped_requests, 1);
        assert_eq!(server.region_count(), responses.len());
    }

    #[test]
    fn test_far_cells_are_never_sent() {
        let mut server = server();
        let responses = server.handle_sync_request(&LevelSyncRequest {
            observer_position: Vec3::new(3e8, 0.0, 0.0),
            view_radius: 15.0,
        });
        assert!(responses.iter().all(|r| r.region_block.extent().is_valid()));
        assert!(responses.is_empty());

        assert_eq!(server.handle_mutation(BlockMutation { x: 3e8, z: 0.0 }), None);
        assert_eq!(server.region_count(), 0);
    }

    #[test]
    fn test_mutation_bumps_version() {
        let mut server = server();
        assert_eq!(server.handle_mutation(BlockMutation { x: 12.0, z: 3.0 }), Some(1));
        assert_eq!(server.handle_mutation(BlockMutation { x: 14.0, z: 8.0 }), Some(2));

        let region = server.region_at(12.0, 3.0).unwrap();
        assert_eq!(region.version(), 2);
        assert_eq!(region.bricks()[0].offset, Vec2::new(2.0, 3.0));

        assert_eq!(server.handle_mutation(BlockMutation { x: f32::NAN, z: 0.0 }), None);
    }

    #[test]
    fn test_handle_packet_replies_on_connection() {
        let mut server = server();
        let reply = QueuedConnection::new(MAX_PACKET_SIZE);
        let request = Packet::encode(
            &Message::LevelRequest(LevelSyncRequest {
                observer_position: Vec3::new(5.0, 0.0, 5.0),
                view_radius: 4.0,
            }),
            MAX_PACKET_SIZE,
        )
        .unwrap();

        server.handle_packet(&request, &reply);
        // Radius 4 around the middle of region (0, 0) stays inside it
        assert_eq!(reply.pending(), 1);
        assert_eq!(server.stats().responses_sent, 1);

        server.handle_packet(&Packet { kind: 1, payload: Vec::new() }, &reply);
        assert_eq!(server.stats().rejected_packets, 1);
    }
}
