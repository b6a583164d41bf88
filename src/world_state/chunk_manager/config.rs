//! Configuration for the chunk manager.

use serde::{Deserialize, Serialize};

use crate::error::{WorldError, WorldResult};
use crate::world_state::lighting::relighter::{validate_span, DEFAULT_SPAN};

/// Largest supported window scale (a 64x64-chunk window).
pub const MAX_WINDOW_SCALE: u32 = 6;

/// Tunables for a [`ChunkManager`](super::ChunkManager).
///
/// Every field has a default, so a JSON document only needs to name the
/// values it changes:
///
/// ```
/// use world_tools::world_state::chunk_manager::ChunkManagerConfig;
///
/// let config = ChunkManagerConfig::from_json(r#"{ "span": 5 }"#).unwrap();
/// assert_eq!(config.span, 5);
/// assert_eq!(config.cache_capacity, 2048);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkManagerConfig {
    /// Log2 of the window side length, in chunks.
    pub window_scale: u32,
    /// Chunks the soft cache holds before evicting.
    pub cache_capacity: usize,
    /// Side length of the neighbourhood relit around a chunk. Odd, 3..=33.
    pub span: usize,
    /// Whether flushing a chunk relights it.
    pub lighting_enabled: bool,
    /// Queued chunks needed before a lookup triggers a cleanup pass.
    pub cleanup_threshold: usize,
    /// Consecutive failed writes after which a chunk's pending write is dropped.
    pub max_write_attempts: u32,
}

impl Default for ChunkManagerConfig {
    fn default() -> Self {
        Self {
            window_scale: 2,
            cache_capacity: 2048,
            span: DEFAULT_SPAN,
            lighting_enabled: true,
            cleanup_threshold: 32,
            max_write_attempts: 3,
        }
    }
}

impl ChunkManagerConfig {
    /// Parses and validates a JSON configuration.
    ///
    /// # Errors
    /// - [`WorldError::Json`] if the document does not parse.
    /// - [`WorldError::InvalidConfig`] if a value is out of bounds.
    pub fn from_json(json: &str) -> WorldResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every field against its bounds.
    ///
    /// # Errors
    /// Returns [`WorldError::InvalidConfig`] naming the first bad field.
    pub fn validate(&self) -> WorldResult<()> {
        if self.window_scale > MAX_WINDOW_SCALE {
            return Err(WorldError::InvalidConfig(format!(
                "window_scale {} exceeds {MAX_WINDOW_SCALE}",
                self.window_scale
            )));
        }
        if self.cache_capacity == 0 {
            return Err(WorldError::InvalidConfig(
                "cache_capacity must be at least 1".to_string(),
            ));
        }
        if self.max_write_attempts == 0 {
            return Err(WorldError::InvalidConfig(
                "max_write_attempts must be at least 1".to_string(),
            ));
        }
        validate_span(self.span)
    }

    /// Side length of the window, in chunks.
    pub fn window_size(&self) -> usize {
        1 << self.window_scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = ChunkManagerConfig::default();
        config.validate().unwrap();
        assert_eq!(config.window_size(), 4);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let config = ChunkManagerConfig::from_json(r#"{ "lighting_enabled": false }"#).unwrap();
        assert!(!config.lighting_enabled);
        assert_eq!(config.window_scale, 2);
        assert_eq!(config.max_write_attempts, 3);
    }

    #[test]
    fn out_of_bounds_values_are_rejected() {
        for json in [
            r#"{ "window_scale": 7 }"#,
            r#"{ "cache_capacity": 0 }"#,
            r#"{ "span": 4 }"#,
            r#"{ "span": 35 }"#,
            r#"{ "max_write_attempts": 0 }"#,
        ] {
            assert!(
                matches!(
                    ChunkManagerConfig::from_json(json),
                    Err(WorldError::InvalidConfig(_))
                ),
                "{json} was accepted"
            );
        }
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            ChunkManagerConfig::from_json("{ span: 3"),
            Err(WorldError::Json(_))
        ));
    }
}
