//! Per-channel tuning knobs.

use serde::{Deserialize, Serialize};

use crate::buffer::DEFAULT_BUFFER_CAPACITY;

/// Default ceiling on the logical file size (1 GiB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 1024 * 1024 * 1024;

/// Settings applied when a channel is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    /// Bytes staged before a write is handed to the OS.
    pub buffer_capacity: usize,
    /// Writes that would take the logical offset to this value are rejected.
    pub max_file_size: u64,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

impl ChannelConfig {
    pub fn with_buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity;
        self
    }

    pub fn with_max_file_size(mut self, limit: u64) -> Self {
        self.max_file_size = limit;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ChannelConfig::default();
        assert_eq!(config.buffer_capacity, 4096);
        assert_eq!(config.max_file_size, 1 << 30);
    }

    #[test]
    fn builder_overrides() {
        let config = ChannelConfig::default()
            .with_buffer_capacity(16)
            .with_max_file_size(1000);
        assert_eq!(config.buffer_capacity, 16);
        assert_eq!(config.max_file_size, 1000);
    }
}
