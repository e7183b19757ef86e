//! Streams a large ground-plane world to a client in bounded region blocks,
//! keeping only the regions near the observer materialized.

pub mod config;
pub mod error;
pub mod network;
pub mod streaming;
pub mod world;

pub use config::{ServerConfig, StreamConfig};
pub use error::{StreamError, StreamResult};
pub use network::{
    BlockMutation, Connection, LevelSyncRequest, LevelSyncResponse, Message, MessageKind,
    MutationClient, Packet, QueuedConnection, RegionServer, SyncClient, SyncState,
};
pub use streaming::{
    CachedBlock, CachedBlockId, HeadlessBackend, LocalCache, ObserverProvider, Reconciled,
    SharedObserver, VisualBackend, VisualKind,
};
pub use world::{Brick, RegionBlock, RegionExtent};
