//! Bus configuration.

/// Default limit on nested `publish` calls on a single thread.
pub const DEFAULT_MAX_PUBLISH_DEPTH: usize = 64;

/// Event bus configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusConfig {
    /// Name for logging
    pub name: String,
    /// Maximum nesting of publish calls on one thread before `DepthExceeded`
    pub max_publish_depth: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            name: "event-bus".to_string(),
            max_publish_depth: DEFAULT_MAX_PUBLISH_DEPTH,
        }
    }
}

impl BusConfig {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_max_publish_depth(mut self, depth: usize) -> Self {
        self.max_publish_depth = depth;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_defaults() {
        let config = BusConfig::default()
            .with_name("game-loop")
            .with_max_publish_depth(8);
        assert_eq!(config.name, "game-loop");
        assert_eq!(config.max_publish_depth, 8);
        assert_eq!(
            BusConfig::default().max_publish_depth,
            DEFAULT_MAX_PUBLISH_DEPTH
        );
    }
}
