use std::{net::SocketAddr, path::Path};

use crate::RecapConfig;

/// Validation output for a loaded Recap configuration.
#[derive(Debug, Default)]
pub struct ConfigReport {
    warnings: Vec<String>,
    errors: Vec<String>,
}

impl ConfigReport {
    /// Returns true when no errors were found.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns true when at least one error was found.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Returns the collected warning messages.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Render warnings and errors into a readable, multi-line string.
    pub fn format(&self) -> String {
        let mut out = String::new();
        if !self.errors.is_empty() {
            out.push_str("Errors:\n");
            for err in &self.errors {
                out.push_str("  - ");
                out.push_str(err);
                out.push('\n');
            }
        }
        if !self.warnings.is_empty() {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str("Warnings:\n");
            for warn in &self.warnings {
                out.push_str("  - ");
                out.push_str(warn);
                out.push('\n');
            }
        }
        out
    }

    fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }
}

/// Validate a Recap configuration and return a report of issues.
pub fn validate(cfg: &RecapConfig) -> ConfigReport {
    let mut report = ConfigReport::default();

    validate_server(cfg, &mut report);
    validate_cache(cfg, &mut report);

    report
}

fn validate_server(cfg: &RecapConfig, report: &mut ConfigReport) {
    let listen = cfg.server.listen.trim();
    if listen.is_empty() {
        report.error("server.listen is empty");
    } else if listen.parse::<SocketAddr>().is_err() {
        report.error(format!(
            "server.listen '{listen}' is not a valid socket address"
        ));
    }

    if cfg.server.max_request_headers_bytes == 0 {
        report.warn("server.max_request_headers_bytes is 0; header size is unbounded");
    }
    if cfg.server.max_request_body_bytes == 0 {
        report.warn("server.max_request_body_bytes is 0; body size is unbounded");
    }
}

fn validate_cache(cfg: &RecapConfig, report: &mut ConfigReport) {
    let dir = cfg.cache.dir.trim();
    if dir.is_empty() {
        report.error("cache.dir is empty");
        return;
    }

    let cache_path = Path::new(dir);
    if cache_path.exists() {
        if !cache_path.is_dir() {
            report.error(format!("cache.dir '{dir}' exists but is not a directory"));
        }
    } else {
        report.warn(format!(
            "cache.dir '{dir}' does not exist; it will be created at startup"
        ));
    }
}
