//! Server configuration: identity and operating mode shared by both roles.
//! No TLS, rate limiting, or DPoP here — authentication is left to
//! network-policy isolation at the cluster level, not this process.

use gpumcp_core::OperationMode;

/// Identity and operating-mode configuration shared by both roles.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server name advertised in the `initialize` handshake.
    pub name: String,
    /// Server version advertised in the `initialize` handshake.
    pub version: String,
    /// Whether mutating tools (none shipped today) are permitted to run.
    pub mode: OperationMode,
}

impl ServerConfig {
    /// Build a config for the given server identity, defaulting to
    /// read-only mode.
    #[must_use]
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self { name: name.into(), version: version.into(), mode: OperationMode::ReadOnly }
    }

    /// Override the operation mode.
    #[must_use]
    pub const fn mode(mut self, mode: OperationMode) -> Self {
        self.mode = mode;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_defaults_to_read_only() {
        let config = ServerConfig::new("gpumcp-agent", "0.1.0");
        assert_eq!(config.mode, OperationMode::ReadOnly);
        assert_eq!(config.name, "gpumcp-agent");
    }

    #[test]
    fn mode_builder_overrides() {
        let config = ServerConfig::new("gpumcp-agent", "0.1.0").mode(OperationMode::Operator);
        assert_eq!(config.mode, OperationMode::Operator);
    }
}
