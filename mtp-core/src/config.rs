//! Tunables shared by the request layer.

use std::time::Duration;

/// Configuration for message id generation and temp-key binding.
#[derive(Clone, Debug)]
pub struct Config {
    /// Seconds added to the local clock when deriving message ids, to
    /// follow the server's notion of time.
    pub time_offset: i32,
    /// Lifetime requested for a temporary key binding.
    pub bind_key_expires_in: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            time_offset: 0,
            bind_key_expires_in: Duration::from_secs(3600),
        }
    }
}
