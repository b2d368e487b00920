//! Database configuration.

/// Configuration for opening a database.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Log record rejections at `warn` instead of `debug`.
    pub verbose: bool,

    /// Write indented snapshot JSON on save.
    pub pretty_snapshots: bool,

    /// Fail a load when the snapshot names collections that are not
    /// registered, instead of skipping them.
    pub strict_load: bool,
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether rejections are logged at `warn`.
    #[must_use]
    pub const fn verbose(mut self, value: bool) -> Self {
        self.verbose = value;
        self
    }

    /// Sets whether saved snapshots are indented.
    #[must_use]
    pub const fn pretty_snapshots(mut self, value: bool) -> Self {
        self.pretty_snapshots = value;
        self
    }

    /// Sets whether unknown snapshot collections fail a load.
    #[must_use]
    pub const fn strict_load(mut self, value: bool) -> Self {
        self.strict_load = value;
        self
    }
}
