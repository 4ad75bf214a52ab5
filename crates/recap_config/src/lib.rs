use serde::Deserialize;

mod recap;
mod validation;

pub use recap::RecapConfig;
pub use validation::ConfigReport;

// =======================================================
// GLOBAL CONFIG + DEFAULTS
// =======================================================
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    pub log_level: String,
    pub max_connections: u16,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
            max_connections: 256,
        }
    }
}

// =======================================================
// SERVER CONFIG + DEFAULTS
// =======================================================
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the proxy listens on. The port matches the mock server the
    /// tutorial suites point their instrumented clients at.
    pub listen: String,

    // Timeouts (seconds)
    pub client_read_timeout_secs: u64,

    // Limits (bytes)
    pub max_request_headers_bytes: u64,
    pub max_request_body_bytes: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:8001".into(),
            client_read_timeout_secs: 15,
            max_request_headers_bytes: 64 * 1024,
            max_request_body_bytes: 10 * 1024 * 1024,
        }
    }
}

// =======================================================
// UPSTREAM CONFIG + DEFAULTS
// =======================================================
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Connect timeout for the real upstream call on a cache miss.
    /// 0 disables the timeout: a hung upstream then blocks its task, which
    /// matches the original recorder behavior.
    pub connect_timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 0,
        }
    }
}

impl UpstreamConfig {
    pub fn connect_timeout_secs(&self) -> u64 {
        self.connect_timeout_secs
    }
}

// =======================================================
// CACHE CONFIG + DEFAULTS
// =======================================================
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Directory holding one file per recorded response, named by the
    /// request fingerprint. Deleting files here is the only invalidation.
    pub dir: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { dir: "cache".into() }
    }
}

impl CacheConfig {
    pub fn dir(&self) -> &str {
        &self.dir
    }
}
