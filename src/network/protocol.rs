//! Protocol constants shared by client and server

/// Message kind ids on the wire
pub const MSG_LEVEL_REQUEST: u16 = 48;
pub const MSG_LEVEL_RESPONSE: u16 = 49;
pub const MSG_LEVEL_UPDATE: u16 = 50;

/// Network limits
pub const MAX_PACKET_SIZE: usize = 65536; // 64KB max packet size

/// Streaming defaults
pub const DEFAULT_VIEW_RADIUS: f32 = 15.0;
pub const DEFAULT_REGION_SIZE: f32 = 10.0;
pub const MAX_VIEW_RADIUS: f32 = 256.0;
