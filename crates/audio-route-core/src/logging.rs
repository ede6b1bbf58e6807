//! Tracing subscriber setup for audio route diagnostics
//!
//! Route decisions are logged under the `rvoip_audio_route_core` target:
//! lifecycle and selection changes at `info`, every arbitration cycle at
//! `debug`, redundant hardware toggles at `trace`. [`setup_logging`] installs
//! a global subscriber that shows this crate at the configured level and
//! nothing else unless extra directives are given.
//!
//! The settings live in the `[logging]` table of the manager configuration:
//!
//! ```toml
//! [logging]
//! level = "debug"
//! json = true
//! directives = ["my_softphone=info"]
//! ```

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{info, Level};
use tracing_subscriber::filter::Directive;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{fmt, EnvFilter};

use crate::error::{AudioRouteError, AudioRouteResult};

/// Target of every event this crate emits
pub const LOG_TARGET: &str = "rvoip_audio_route_core";

/// Logging section of [`AudioRouteConfig`](crate::AudioRouteConfig)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Level for the audio route target (`error` through `trace`)
    pub level: String,
    /// Emit JSON lines instead of the human readable format
    pub json: bool,
    /// Include source file and line
    pub file_info: bool,
    /// Log span enter/exit
    pub log_spans: bool,
    /// Extra filter directives, e.g. `"my_app=debug"`
    pub directives: Vec<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file_info: false,
            log_spans: false,
            directives: Vec::new(),
        }
    }
}

impl LoggingConfig {
    /// Logging at `level` for the audio route target
    pub fn new(level: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            ..Default::default()
        }
    }

    /// Emit JSON lines
    pub fn with_json(mut self) -> Self {
        self.json = true;
        self
    }

    /// Include file and line
    pub fn with_file_info(mut self) -> Self {
        self.file_info = true;
        self
    }

    /// Log span enter/exit
    pub fn with_spans(mut self) -> Self {
        self.log_spans = true;
        self
    }

    /// Add a filter directive for another target
    pub fn with_directive(mut self, directive: impl Into<String>) -> Self {
        self.directives.push(directive.into());
        self
    }

    /// Check the level and every directive
    pub fn validate(&self) -> AudioRouteResult<()> {
        self.build_filter().map(|_| ())
    }

    /// Filter for this configuration
    ///
    /// `RUST_LOG`, when set, replaces the default `rvoip_audio_route_core`
    /// directive; configured directives are added on top either way.
    pub fn build_filter(&self) -> AudioRouteResult<EnvFilter> {
        let level = parse_log_level(&self.level)?;
        let default = format!("{}={}", LOG_TARGET, level.as_str().to_ascii_lowercase());
        let mut filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

        for directive in &self.directives {
            let parsed = directive
                .parse::<Directive>()
                .map_err(|e| AudioRouteError::config(format!("Invalid log directive {}: {}", directive, e)))?;
            filter = filter.add_directive(parsed);
        }
        Ok(filter)
    }
}

/// Install the global `tracing` subscriber
///
/// Fails with [`AudioRouteError::Logging`] if a global subscriber is already
/// installed, and with a configuration error for a bad level or directive.
pub fn setup_logging(config: &LoggingConfig) -> AudioRouteResult<()> {
    let filter = config.build_filter()?;

    let span_events = if config.log_spans {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let builder = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_span_events(span_events)
        .with_file(config.file_info)
        .with_line_number(config.file_info);

    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| AudioRouteError::logging(e.to_string()))?;

    info!(
        target: LOG_TARGET,
        "Audio route logging at {} (rvoip-audio-route-core v{})",
        config.level,
        crate::VERSION
    );
    Ok(())
}

/// Parse a level name, case-insensitive
pub fn parse_log_level(level: &str) -> AudioRouteResult<Level> {
    Level::from_str(level.trim()).map_err(|_| AudioRouteError::config(format!("Invalid log level: {}", level)))
}
