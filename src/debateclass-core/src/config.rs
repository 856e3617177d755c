//! Configuration module for loading TOML config files.
//!
//! Every section is optional; anything left out takes the classroom
//! defaults from [`default_config`].

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::DebateError;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub playback: PlaybackConfig,
    pub frameworks: FrameworksConfig,
    pub rebuttals: RebuttalsConfig,
    pub export: ExportConfig,
}

/// Playback cadence.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Delay between revealed script lines.
    pub tick_interval_ms: u64,
    /// Delay between the last line and the verdict.
    pub verdict_delay_ms: u64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 2200,
            verdict_delay_ms: 600,
        }
    }
}

impl PlaybackConfig {
    /// Never shorter than 1 ms; a zero period cannot be armed.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    pub fn verdict_delay(&self) -> Duration {
        Duration::from_millis(self.verdict_delay_ms)
    }
}

/// Options for the two framework selectors. These only label the report;
/// the script does not change with them.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FrameworksConfig {
    pub student: Vec<String>,
    pub ai: Vec<String>,
}

impl Default for FrameworksConfig {
    fn default() -> Self {
        Self {
            student: vec![
                "Student (Human)".to_string(),
                "Utilitarian".to_string(),
                "Virtue Ethics".to_string(),
            ],
            ai: vec![
                "AI Model (Biased)".to_string(),
                "Deontological".to_string(),
                "Care Ethics".to_string(),
            ],
        }
    }
}

impl FrameworksConfig {
    pub fn default_student(&self) -> &str {
        self.student.first().map(String::as_str).unwrap_or("Student (Human)")
    }

    pub fn default_ai(&self) -> &str {
        self.ai.first().map(String::as_str).unwrap_or("AI Model (Biased)")
    }
}

/// Canned replies appended after an injected argument.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RebuttalsConfig {
    pub ai: String,
    pub student: String,
}

impl Default for RebuttalsConfig {
    fn default() -> Self {
        Self {
            ai: "Your concern is noted—but optimisation still dominates outcome space.".to_string(),
            student: "That very assumption is the ethical flaw we're exposing.".to_string(),
        }
    }
}

/// Report layout and destination.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ExportConfig {
    pub output_dir: PathBuf,
    pub lines_per_page: usize,
    pub line_width: usize,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            lines_per_page: 48,
            line_width: 90,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DebateError> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| DebateError::ConfigError(format!("Failed to read config: {}", e)))?;

        Self::from_str(&content)
    }

    /// Load configuration from string content.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, DebateError> {
        let config: Config = toml::from_str(content)
            .map_err(|e| DebateError::ConfigError(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), DebateError> {
        if self.playback.tick_interval_ms == 0 {
            return Err(DebateError::ConfigError(
                "playback.tick_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.export.lines_per_page < 8 {
            return Err(DebateError::ConfigError(
                "export.lines_per_page must be at least 8".to_string(),
            ));
        }
        if self.export.line_width < 20 {
            return Err(DebateError::ConfigError(
                "export.line_width must be at least 20".to_string(),
            ));
        }
        Ok(())
    }

    /// Check a framework choice against the configured options.
    pub fn check_framework(&self, is_student: bool, choice: &str) -> Result<(), DebateError> {
        let options = if is_student {
            &self.frameworks.student
        } else {
            &self.frameworks.ai
        };

        if options.iter().any(|o| o == choice) {
            Ok(())
        } else {
            Err(DebateError::ConfigError(format!(
                "Unknown framework '{}'. Available: {}",
                choice,
                options.join(", ")
            )))
        }
    }
}

/// Default configuration embedded in the binary.
pub fn default_config() -> Config {
    Config::default()
}
