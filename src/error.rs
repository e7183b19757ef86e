//! Error handling for region streaming
//!
//! A single error type shared by the cache, the protocol codec and the
//! configuration layer. The per-tick entry points never return these; they
//! log and carry on, and the next tick retries implicitly.

use thiserror::Error;

/// Main error type for region streaming
#[derive(Debug, Error)]
pub enum StreamError {
    // Cache Errors
    #[error("a cached region already covers ({x}, {z})")]
    DuplicateRegion { x: f32, z: f32 },

    #[error("region at ({x}, {z}) has an empty or non-finite extent")]
    InvalidRegion { x: f32, z: f32 },

    // Protocol Errors
    #[error("codec error: {0}")]
    Codec(#[from] bincode::Error),

    #[error("packet of {size} bytes exceeds limit of {max_size}")]
    PacketTooLarge { size: usize, max_size: usize },

    #[error("unknown message kind {id}")]
    UnknownMessageKind { id: u16 },

    #[error("protocol error: {message}")]
    ProtocolError { message: String },

    #[error("connection is not available")]
    Disconnected,

    // Configuration Errors
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("invalid config field {field} = {value}: {reason}")]
    InvalidConfig {
        field: String,
        value: String,
        reason: String,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for region streaming
pub type StreamResult<T> = Result<T, StreamError>;

impl StreamError {
    /// Shorthand for a rejected configuration value
    pub fn invalid_config(
        field: impl Into<String>,
        value: impl std::fmt::Display,
        reason: impl Into<String>,
    ) -> Self {
        StreamError::InvalidConfig {
            field: field.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}
