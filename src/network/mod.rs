pub mod error;
pub mod packet;
pub mod protocol;
pub mod connection;
pub mod client;
pub mod mutation;
pub mod server;

pub use packet::{
    Packet, Message, MessageKind,
    LevelSyncRequest, LevelSyncResponse, BlockMutation,
};
pub use protocol::{
    MAX_PACKET_SIZE, MAX_VIEW_RADIUS,
    MSG_LEVEL_REQUEST, MSG_LEVEL_RESPONSE, MSG_LEVEL_UPDATE,
    DEFAULT_VIEW_RADIUS, DEFAULT_REGION_SIZE,
};
pub use connection::{Connection, ConnectionState, ConnectionStats, QueuedConnection};
pub use client::{SyncClient, SyncState, SyncStats, ResponseOutcome};
pub use mutation::{MutationClient, MutationStats, LocalMutation, NoLocalMutation, Placement};
pub use server::{RegionServer, RegionCoord, ServerStats};
pub use error::{NetworkResult, protocol_error, unknown_kind};
