//! Client and server configuration
//!
//! Both configs deserialize from TOML with every field optional, falling back
//! to the defaults below.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{StreamError, StreamResult};
use crate::network::protocol::{
    DEFAULT_REGION_SIZE, DEFAULT_VIEW_RADIUS, MAX_PACKET_SIZE, MAX_VIEW_RADIUS,
};

/// Client-side streaming configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Distance around the observer within which regions stay materialized
    pub view_radius: f32,
    /// Ticks between consecutive sync requests
    pub request_interval_ticks: u32,
    /// Largest frame accepted or produced by the codec
    pub max_packet_size: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            view_radius: DEFAULT_VIEW_RADIUS,
            request_interval_ticks: 1,
            max_packet_size: MAX_PACKET_SIZE,
        }
    }
}

impl StreamConfig {
    /// Parse from a TOML document and validate
    pub fn from_toml_str(source: &str) -> StreamResult<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file and validate
    pub fn load(path: impl AsRef<Path>) -> StreamResult<Self> {
        let source = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> StreamResult<()> {
        if !self.view_radius.is_finite() || self.view_radius <= 0.0 {
            return Err(StreamError::invalid_config(
                "view_radius",
                self.view_radius,
                "must be a positive finite distance",
            ));
        }
        if self.request_interval_ticks == 0 {
            return Err(StreamError::invalid_config(
                "request_interval_ticks",
                self.request_interval_ticks,
                "must be at least 1",
            ));
        }
        if self.max_packet_size == 0 {
            return Err(StreamError::invalid_config(
                "max_packet_size",
                self.max_packet_size,
                "must be non-zero",
            ));
        }
        Ok(())
    }
}

/// Reference server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Edge length of each square region block on the ground plane
    pub region_size: f32,
    /// Upper bound on responses produced for one sync request
    pub max_blocks_per_response: usize,
    /// Requests asking for a larger radius are answered as if they asked
    /// for this one
    pub max_view_radius: f32,
    pub max_packet_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            region_size: DEFAULT_REGION_SIZE,
            max_blocks_per_response: 64,
            max_view_radius: MAX_VIEW_RADIUS,
            max_packet_size: MAX_PACKET_SIZE,
        }
    }
}

impl ServerConfig {
    pub fn from_toml_str(source: &str) -> StreamResult<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> StreamResult<Self> {
        let source = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> StreamResult<()> {
        if !self.region_size.is_finite() || self.region_size <= 0.0 {
            return Err(StreamError::invalid_config(
                "region_size",
                self.region_size,
                "must be a positive finite size",
            ));
        }
        if self.max_blocks_per_response == 0 {
            return Err(StreamError::invalid_config(
                "max_blocks_per_response",
                self.max_blocks_per_response,
                "must be at least 1",
            ));
        }
        if !self.max_view_radius.is_finite() || self.max_view_radius <= 0.0 {
            return Err(StreamError::invalid_config(
                "max_view_radius",
                self.max_view_radius,
                "must be a positive finite distance",
            ));
        }
        if self.max_packet_size == 0 {
            return Err(StreamError::invalid_config(
                "max_packet_size",
                self.max_packet_size,
                "must be non-zero",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = StreamConfig::default();
        assert_eq!(config.view_radius, 15.0);
        assert_eq!(config.request_interval_ticks, 1);
        assert!(config.validate().is_ok());
        assert!(ServerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = StreamConfig::from_toml_str("view_radius = 32.5\n").unwrap();
        assert_eq!(config.view_radius, 32.5);
        assert_eq!(config.request_interval_ticks, 1);
        assert_eq!(config.max_packet_size, MAX_PACKET_SIZE);
    }

    #[test]
    fn test_rejects_bad_radius() {
        let err = StreamConfig::from_toml_str("view_radius = -1.0").unwrap_err();
        assert!(matches!(err, StreamError::InvalidConfig { ref field, .. } if field == "view_radius"));

        let err = StreamConfig::from_toml_str("request_interval_ticks = 0").unwrap_err();
        assert!(matches!(err, StreamError::InvalidConfig { .. }));
    }

    #[test]
    fn test_server_rejects_bad_limits() {
        let err = ServerConfig::from_toml_str("max_packet_size = 0").unwrap_err();
        assert!(matches!(err, StreamError::InvalidConfig { ref field, .. } if field == "max_packet_size"));

        let err = ServerConfig::from_toml_str("max_view_radius = 0.0").unwrap_err();
        assert!(matches!(err, StreamError::InvalidConfig { ref field, .. } if field == "max_view_radius"));
    }

    #[test]
    fn test_rejects_malformed_toml() {
        let err = ServerConfig::from_toml_str("region_size = [").unwrap_err();
        assert!(matches!(err, StreamError::ConfigParse(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "region_size = 16.0").unwrap();
        writeln!(file, "max_blocks_per_response = 4").unwrap();

        let config = ServerConfig::load(file.path()).unwrap();
        assert_eq!(config.region_size, 16.0);
        assert_eq!(config.max_blocks_per_response, 4);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = StreamConfig::load(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, StreamError::Io(_)));
    }
}
