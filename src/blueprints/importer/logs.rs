//! Structured log capture for import runs.
//!
//! Validation and apply record their events into a [`LogCapture`] so the task
//! can attach them to its outcome. Every recorded event is also forwarded to
//! the `log` facade.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl From<LogLevel> for log::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Info => log::Level::Info,
            LogLevel::Warning => log::Level::Warn,
            LogLevel::Error => log::Level::Error,
        }
    }
}

/// One captured log event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEvent {
    pub log_level: LogLevel,
    pub event: String,
    pub attributes: BTreeMap<String, Value>,
}

impl LogEvent {
    pub fn new(log_level: LogLevel, event: impl Into<String>) -> Self {
        Self {
            log_level,
            event: event.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

impl fmt::Display for LogEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.event)?;
        for (key, value) in &self.attributes {
            match value {
                Value::String(text) => write!(f, " {}={}", key, text)?,
                other => write!(f, " {}={}", key, other)?,
            }
        }
        Ok(())
    }
}

/// Collects [`LogEvent`]s emitted during an import run.
#[derive(Debug, Clone, Default)]
pub struct LogCapture {
    events: Vec<LogEvent>,
}

impl LogCapture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an event and forward it to the `log` facade.
    pub fn record(&mut self, event: LogEvent) {
        log::log!(target: "idp_engine::blueprints::importer", log::Level::from(event.log_level), "{}", event);
        self.events.push(event);
    }

    pub fn events(&self) -> &[LogEvent] {
        &self.events
    }

    pub fn has_errors(&self) -> bool {
        self.events
            .iter()
            .any(|event| event.log_level >= LogLevel::Error)
    }

    pub fn into_events(self) -> Vec<LogEvent> {
        self.events
    }
}
