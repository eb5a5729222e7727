//! Server configuration.

/// Configuration for the collaboration server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Maximum number of operations in one submitted delta.
    pub max_delta_ops: usize,
    /// Maximum number of characters one delta may insert.
    pub max_insert_chars: usize,
    /// Capacity of each document's event channel.
    pub broadcast_capacity: usize,
    /// Maximum number of entries in a history response.
    pub max_history_batch: u32,
}

impl ServerConfig {
    /// Creates a new server configuration with default limits.
    pub fn new() -> Self {
        Self {
            max_delta_ops: 10_000,
            max_insert_chars: 1_000_000,
            broadcast_capacity: 256,
            max_history_batch: 500,
        }
    }

    /// Sets the maximum number of operations per delta.
    pub fn with_max_delta_ops(mut self, max: usize) -> Self {
        self.max_delta_ops = max;
        self
    }

    /// Sets the maximum number of inserted characters per delta.
    pub fn with_max_insert_chars(mut self, max: usize) -> Self {
        self.max_insert_chars = max;
        self
    }

    /// Sets the event channel capacity.
    pub fn with_broadcast_capacity(mut self, capacity: usize) -> Self {
        self.broadcast_capacity = capacity.max(1);
        self
    }

    /// Sets the maximum history batch size.
    pub fn with_max_history_batch(mut self, size: u32) -> Self {
        self.max_history_batch = size.max(1);
        self
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new()
    }
}
