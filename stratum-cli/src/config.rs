//! CLI configuration
//!
//! CLI-specific configuration: the project file structure and the log
//! level wiring for per-phase targets.

use serde::Deserialize;
use stratum_config::Settings;
use tracing::Level;

/// The `stratum.json` project file.
#[derive(Debug, Deserialize)]
pub struct ProjectConfig {
    /// Path to the module file, relative to the project file.
    pub input: String,
    /// Pipeline settings, all optional.
    #[serde(default)]
    pub settings: Settings,
    /// Logging section.
    #[serde(default)]
    pub log: LogSection,
}

/// Logging options from the project file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LogSection {
    /// Global level: "error", "warn", "info", "debug", "trace".
    pub level: Option<String>,
    /// Output format: "pretty", "compact", "json".
    pub format: Option<String>,
    /// Per-phase overrides, e.g. { "stage": "trace" }.
    pub phases: std::collections::HashMap<String, String>,
}

/// Resolved log levels per phase target.
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub global: Level,
    pub parse: Option<Level>,
    pub pipeline: Option<Level>,
    pub stage: Option<Level>,
    pub print: Option<Level>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            global: Level::INFO,
            parse: None,
            pipeline: None,
            stage: None,
            print: None,
        }
    }
}

impl LogConfig {
    /// Build from the project file's logging section.
    pub fn from_section(section: &LogSection) -> Self {
        let mut config = Self::default();
        if let Some(level) = section.level.as_deref().and_then(parse_level) {
            config.global = level;
        }
        for (phase, level) in &section.phases {
            let Some(level) = parse_level(level) else {
                continue;
            };
            match phase.as_str() {
                "parse" => config.parse = Some(level),
                "pipeline" => config.pipeline = Some(level),
                "stage" => config.stage = Some(level),
                "print" => config.print = Some(level),
                _ => {}
            }
        }
        config
    }

    /// Get log level for a specific target
    pub fn level_for(&self, target: &str) -> Level {
        match target {
            "stratum::parse" => self.parse.unwrap_or(self.global),
            "stratum::pipeline" => self.pipeline.unwrap_or(self.global),
            "stratum::stage" => self.stage.unwrap_or(self.global),
            "stratum::print" => self.print.unwrap_or(self.global),
            _ => self.global,
        }
    }
}

/// Parse a log level string.
pub fn parse_level(s: &str) -> Option<Level> {
    match s.to_lowercase().as_str() {
        "error" | "silent" => Some(Level::ERROR),
        "warn" => Some(Level::WARN),
        "info" => Some(Level::INFO),
        "debug" => Some(Level::DEBUG),
        "trace" => Some(Level::TRACE),
        _ => None,
    }
}
