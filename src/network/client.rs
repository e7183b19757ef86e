//! Periodic pull synchronization of the local region cache
//!
//! Every tick while bound to an observer and connected, the client sends a
//! `LevelSyncRequest` for the observer's current position. Requests carry no
//! correlation id; any `LevelSyncResponse` that arrives is reconciled into
//! the cache and followed by an eviction pass against the observer position
//! at handling time, not at send time.

use glam::Vec3;

use super::connection::Connection;
use super::packet::{LevelSyncRequest, LevelSyncResponse, Message, MessageKind, Packet};
use crate::config::StreamConfig;
use crate::error::StreamResult;
use crate::streaming::{CachedBlockId, LocalCache, ObserverProvider, Reconciled, VisualBackend};

/// Client state
///
/// Binding happens once. If the observer later disappears the client stays
/// `Bound` and simply skips requests until it returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// No observer seen yet
    Unbound,
    /// Observer seen, sync loop active
    Bound,
}

/// Client statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    pub requests_sent: u64,
    pub send_failures: u64,
    pub responses_handled: u64,
    pub unrecognized_messages: u64,
    pub decode_failures: u64,
}

/// What handling one response did to the cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseOutcome {
    pub reconciled: Reconciled,
    pub evicted: Vec<CachedBlockId>,
}

/// Request side of the streaming protocol, owner of the local cache
pub struct SyncClient<B, C, O>
where
    B: VisualBackend,
    C: Connection,
    O: ObserverProvider,
{
    cache: LocalCache<B>,
    connection: C,
    observer: O,
    config: StreamConfig,
    state: SyncState,
    /// Ticks since binding
    bound_ticks: u64,
    stats: SyncStats,
}

impl<B, C, O> SyncClient<B, C, O>
where
    B: VisualBackend,
    C: Connection,
    O: ObserverProvider,
{
    /// Create a client with an empty cache. Fails if `config` is invalid.
    pub fn new(config: StreamConfig, backend: B, connection: C, observer: O) -> StreamResult<Self> {
        config.validate()?;
        log::info!("Local world started with view radius {}", config.view_radius);

        Ok(Self {
            cache: LocalCache::new(backend),
            connection,
            observer,
            config,
            state: SyncState::Unbound,
            bound_ticks: 0,
            stats: SyncStats::default(),
        })
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn cache(&self) -> &LocalCache<B> {
        &self.cache
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    pub fn view_radius(&self) -> f32 {
        self.config.view_radius
    }

    pub fn stats(&self) -> SyncStats {
        self.stats
    }

    pub fn connection(&self) -> &C {
        &self.connection
    }

    /// Per-frame entry point: bind the observer if needed, then send a sync
    /// request when the cadence allows.
    pub fn tick(&mut self) {
        if self.state == SyncState::Unbound {
            match self.observer.observer_position() {
                Some(position) => {
                    log::info!("Bound to observer at {:?}", position);
                    self.state = SyncState::Bound;
                }
                None => return,
            }
        }

        let due = self.bound_ticks % u64::from(self.config.request_interval_ticks) == 0;
        self.bound_ticks += 1;
        if !due {
            return;
        }

        let Some(position) = self.observer.observer_position() else {
            log::trace!("Observer unavailable, skipping sync request");
            return;
        };
        if !self.connection.is_connected() {
            return;
        }

        self.send_request(position);
    }

    fn send_request(&mut self, position: Vec3) {
        let request = LevelSyncRequest {
            observer_position: position,
            view_radius: self.config.view_radius,
        };

        match self.connection.send(Message::LevelRequest(request)) {
            Ok(()) => self.stats.requests_sent += 1,
            Err(e) => {
                log::warn!("Failed to send level request: {}", e);
                self.stats.send_failures += 1;
            }
        }
    }

    /// Handler for inbound frames. Anything other than a well-formed
    /// `LevelResponse` is logged and dropped.
    pub fn handle_packet(&mut self, packet: &Packet) -> Option<ResponseOutcome> {
        match packet.message_kind() {
            Some(MessageKind::LevelResponse) => match packet.decode(self.config.max_packet_size) {
                Ok(message) => self.handle_message(message),
                Err(e) => {
                    log::warn!("Dropping malformed level response: {}", e);
                    self.stats.decode_failures += 1;
                    None
                }
            },
            Some(kind) => {
                log::warn!("Unexpected message type {:?} in local world", kind);
                self.stats.unrecognized_messages += 1;
                None
            }
            None => {
                log::warn!("Unknown message type {} in local world", packet.kind);
                self.stats.unrecognized_messages += 1;
                None
            }
        }
    }

    /// Handler for already decoded messages
    pub fn handle_message(&mut self, message: Message) -> Option<ResponseOutcome> {
        match message {
            Message::LevelResponse(response) => Some(self.handle_response(response)),
            other => {
                log::warn!("Unexpected message type {:?} in local world", other.kind());
                self.stats.unrecognized_messages += 1;
                None
            }
        }
    }

    /// Reconcile the carried region, then evict against the current observer
    pub fn handle_response(&mut self, response: LevelSyncResponse) -> ResponseOutcome {
        self.stats.responses_handled += 1;

        let reconciled = self.cache.reconcile(response.region_block);
        if let Reconciled::Updated { id, .. } = reconciled {
            log::info!("Got update for local block {:?}", id);
        }

        // Eviction needs a position to measure against. Without an observer
        // the cache is left as is until a later response finds one again.
        let evicted = match self.observer.observer_position() {
            Some(position) => self.cache.evict(position, self.config.view_radius),
            None => Vec::new(),
        };

        ResponseOutcome { reconciled, evicted }
    }
}

impl<B, C, O> std::fmt::Debug for SyncClient<B, C, O>
where
    B: VisualBackend,
    C: Connection,
    O: ObserverProvider,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncClient")
            .field("cache", &self.cache)
            .field("config", &self.config)
            .field("state", &self.state)
            .field("bound_ticks", &self.bound_ticks)
            .field("stats", &self.stats)
            .finish()
    }
}
