use serde::Deserialize;

use crate::validation::{ConfigReport, validate};
use crate::{CacheConfig, GlobalConfig, ServerConfig, UpstreamConfig};

// =======================================================
// RECAP CONFIG — main config
// =======================================================
#[derive(Debug, Deserialize, Default)]
pub struct RecapConfig {
    #[serde(default)]
    pub global: GlobalConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub upstream: UpstreamConfig,

    #[serde(default)]
    pub cache: CacheConfig,
}

impl RecapConfig {
    pub fn upstream(&self) -> &UpstreamConfig {
        &self.upstream
    }

    pub fn cache(&self) -> &CacheConfig {
        &self.cache
    }

    /// Validate the configuration and return a report of warnings and errors.
    pub fn validate(&self) -> ConfigReport {
        validate(self)
    }

    pub fn from_file(file_name: &str) -> Result<Self, config::ConfigError> {
        let built = config::Config::builder()
            .add_source(config::File::new(file_name, config::FileFormat::Ini).required(false))
            .build()?;

        built.try_deserialize()
    }

    pub fn from_file_or_default(file_name: &str) -> Self {
        match Self::from_file(file_name) {
            Ok(cfg) => {
                let report = cfg.validate();
                if report.has_errors() {
                    eprintln!("⚠️  Invalid config in '{file_name}':");
                    eprintln!("{}", report.format());
                    eprintln!("➡️  Using default config (in-memory)...");
                    RecapConfig::default()
                } else {
                    if !report.warnings().is_empty() {
                        eprintln!("⚠️  Config warnings in '{file_name}':");
                        eprintln!("{}", report.format());
                    }
                    cfg
                }
            }
            Err(e) => {
                eprintln!("⚠️  Error reading config '{file_name}': {e}");
                eprintln!("➡️  Using default config (in-memory)...");
                RecapConfig::default()
            }
        }
    }

    /// Replace the configured listen port, keeping the host part.
    /// Used by the optional CLI port override.
    pub fn override_port(&mut self, port: u16) {
        let host = self
            .server
            .listen
            .rsplit_once(':')
            .map(|(host, _)| host.to_string())
            .unwrap_or_else(|| self.server.listen.clone());
        self.server.listen = format!("{host}:{port}");
    }

    pub fn print(&self) {
        println!("================ RECAP CONFIG ================");
        self.print_global();
        self.print_server();
        self.print_upstream();
        self.print_cache();
        println!("==============================================");
    }

    fn print_global(&self) {
        println!("\n[global]");
        println!("  log_level            = {}", self.global.log_level);
        println!("  max_connections      = {}", self.global.max_connections);
    }

    fn print_server(&self) {
        println!("\n[server]");
        println!("  listen               = {}", self.server.listen);
        println!(
            "  client_read_timeout_secs = {}",
            self.server.client_read_timeout_secs
        );
        println!(
            "  max_request_headers_bytes = {}",
            self.server.max_request_headers_bytes
        );
        println!(
            "  max_request_body_bytes = {}",
            self.server.max_request_body_bytes
        );
    }

    fn print_upstream(&self) {
        println!("\n[upstream]");
        println!(
            "  connect_timeout_secs = {}",
            self.upstream.connect_timeout_secs
        );
    }

    fn print_cache(&self) {
        println!("\n[cache]");
        println!("  dir                  = {}", self.cache.dir);
    }
}

#[cfg(test)]
mod tests {
    use super::RecapConfig;

    #[test]
    fn defaults_match_mock_server_port() {
        let cfg = RecapConfig::default();
        assert_eq!(cfg.server.listen, "127.0.0.1:8001");
        assert_eq!(cfg.cache.dir, "cache");
        assert_eq!(cfg.upstream.connect_timeout_secs, 0);
    }

    #[test]
    fn override_port_keeps_host() {
        let mut cfg = RecapConfig::default();
        cfg.override_port(9000);
        assert_eq!(cfg.server.listen, "127.0.0.1:9000");
    }

    #[test]
    fn missing_file_yields_defaults() {
        let cfg = RecapConfig::from_file("does-not-exist.conf").expect("optional file");
        assert_eq!(cfg.server.listen, "127.0.0.1:8001");
    }
}
