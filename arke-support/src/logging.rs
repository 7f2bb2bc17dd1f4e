//! Root logger construction and severity/destination configuration.
use serde_derive::{Deserialize, Serialize};
use slog::{o, Drain};
use sloggers::terminal::{Destination, TerminalLoggerBuilder};
use sloggers::types::Severity;
use sloggers::Build;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub destination: String,
}

impl Default for LoggingConfig {
    fn default() -> LoggingConfig {
        LoggingConfig {
            level: "debug".to_owned(),
            destination: "stderr".to_owned(),
        }
    }
}

/// Build the node's root logger from the supplied config section.
pub fn init(cfg: &LoggingConfig) -> slog::Logger {
    let mut builder = TerminalLoggerBuilder::new();
    builder.level(parse_severity(&cfg.level));
    builder.destination(parse_destination(&cfg.destination));

    match builder.build() {
        Ok(drain) => slog::Logger::root(drain.fuse(), o!("component" => "arke")),
        Err(_) => root_logger(),
    }
}

/// A terminal logger at debug level, for tests and quick bring-up without a config file.
pub fn root_logger() -> slog::Logger {
    let mut builder = TerminalLoggerBuilder::new();
    builder.level(Severity::Debug);
    builder.destination(Destination::Stderr);
    let drain = builder.build().expect("failed constructing default logger");
    slog::Logger::root(drain.fuse(), o!("component" => "arke"))
}

fn parse_severity(level: &str) -> Severity {
    match level.to_ascii_lowercase().as_str() {
        "critical" => Severity::Critical,
        "error" => Severity::Error,
        "warning" | "warn" => Severity::Warning,
        "info" => Severity::Info,
        "trace" => Severity::Trace,
        _ => Severity::Debug,
    }
}

fn parse_destination(dest: &str) -> Destination {
    match dest.to_ascii_lowercase().as_str() {
        "stdout" => Destination::Stdout,
        _ => Destination::Stderr,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_builds_a_logger() {
        let cfg = LoggingConfig::default();
        let log = init(&cfg);
        slog::info!(log, "logger came up"; "ok" => true);
    }
}
