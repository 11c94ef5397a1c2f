//! Checker timeouts and tool settings.

use std::time::Duration;

/// Default budget for network and database operations.
pub const DEFAULT_NETWORK_TIMEOUT: Duration = Duration::from_secs(30);
/// Default budget for local tool-version probes.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Settings shared by the default checkers.
#[derive(Debug, Clone)]
pub struct CheckerConfig {
    /// Upper bound for each TCP connect, login or HTTP request.
    pub network_timeout: Duration,
    /// Upper bound for each local subprocess (tool --version, pip show).
    pub probe_timeout: Duration,
    /// Interpreter used to look up Python packages.
    pub python: String,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            network_timeout: DEFAULT_NETWORK_TIMEOUT,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            python: "python3".to_string(),
        }
    }
}

impl CheckerConfig {
    /// Same settings with both timeouts replaced, for fast tests.
    pub fn with_timeouts(mut self, network: Duration, probe: Duration) -> Self {
        self.network_timeout = network;
        self.probe_timeout = probe;
        self
    }
}
