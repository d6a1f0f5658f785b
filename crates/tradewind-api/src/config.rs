//! Settings for the server API.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for a [`ServerApi`](crate::ServerApi).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerApiConfig {
    /// How long `send` waits for the matching reply.
    pub reply_timeout: Duration,
}

impl Default for ServerApiConfig {
    fn default() -> Self {
        Self {
            reply_timeout: Duration::from_secs(60),
        }
    }
}

/// Diagnostic switches for human-facing clients.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebugMode {
    /// Show server complaints to the user instead of only logging them.
    pub comms: bool,
}
