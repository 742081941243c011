//! Configuration builders for tests.

use std::path::Path;

use inscription_config::AppConfig;

/// Fluent builder for [`AppConfig`] in tests.
///
/// Starts from the defaults with port 0, so a server built from it listens
/// on an ephemeral port.
///
/// ```ignore
/// let config = TestConfigBuilder::new()
///     .catalog_path(fixture.catalog_path())
///     .read_timeout_secs(1)
///     .build();
/// ```
pub struct TestConfigBuilder {
    config: AppConfig,
}

impl TestConfigBuilder {
    pub fn new() -> Self {
        let mut config = AppConfig::default();
        config.server.port = 0;
        Self { config }
    }

    pub fn host(mut self, host: &str) -> Self {
        self.config.server.host = host.to_string();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.server.port = port;
        self
    }

    pub fn backlog(mut self, backlog: u32) -> Self {
        self.config.server.backlog = backlog;
        self
    }

    pub fn read_timeout_secs(mut self, secs: u64) -> Self {
        self.config.server.read_timeout_secs = secs;
        self
    }

    pub fn write_timeout_secs(mut self, secs: u64) -> Self {
        self.config.server.write_timeout_secs = secs;
        self
    }

    pub fn catalog_path(mut self, path: impl AsRef<Path>) -> Self {
        self.config.storage.catalog_path = path.as_ref().to_path_buf();
        self
    }

    pub fn registrations_path(mut self, path: impl AsRef<Path>) -> Self {
        self.config.storage.registrations_path = path.as_ref().to_path_buf();
        self
    }

    pub fn log_level(mut self, level: &str) -> Self {
        self.config.logging.level = level.to_string();
        self
    }

    pub fn build(self) -> AppConfig {
        self.config
    }
}

impl Default for TestConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
