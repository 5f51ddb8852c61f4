//! Bridge configuration.

/// Configuration for a [`Bridge`](crate::Bridge).
///
/// Built with `with_*` chaining:
///
/// ```rust
/// use pulsebridge::BridgeConfig;
///
/// let config = BridgeConfig::new("ws://127.0.0.1:8765")
///     .with_auto_connect(true)
///     .with_debug(true);
/// assert_eq!(config.url, "ws://127.0.0.1:8765");
/// ```
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// The collector's WebSocket URL.
    pub url: String,
    /// Connect immediately when the bridge is created.
    pub auto_connect: bool,
    /// Log every outbound envelope at debug level.
    pub debug: bool,
}

impl BridgeConfig {
    /// Creates a configuration pointing at `url`, with auto-connect
    /// and debug logging off.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            auto_connect: false,
            debug: false,
        }
    }

    /// Sets whether the bridge connects at construction time.
    #[must_use]
    pub fn with_auto_connect(mut self, auto_connect: bool) -> Self {
        self.auto_connect = auto_connect;
        self
    }

    /// Sets whether outbound envelopes are logged at debug level.
    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BridgeConfig::new("ws://localhost:9000");
        assert_eq!(config.url, "ws://localhost:9000");
        assert!(!config.auto_connect);
        assert!(!config.debug);
    }

    #[test]
    fn test_builder_chaining() {
        let config = BridgeConfig::new("ws://localhost:9000")
            .with_auto_connect(true)
            .with_debug(true);
        assert!(config.auto_connect);
        assert!(config.debug);
    }
}
