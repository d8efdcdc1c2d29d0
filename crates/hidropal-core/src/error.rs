//! Error types for HidroPal Core
//!
//! Engine operations report expected conditions through
//! [`Outcome`](crate::Outcome) values; the errors here cover setup
//! (configuration, telemetry) and input validation.

use std::path::PathBuf;

use chrono::NaiveDate;

/// Configuration loading and validation errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("cannot read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config text is not valid TOML for this schema
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config could not be rendered
    #[error("cannot serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A value is out of range
    #[error("invalid config value: {0}")]
    Invalid(String),
}

/// Tracing subscriber setup errors
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// Filter directive could not be parsed
    #[error("invalid log filter '{directive}': {reason}")]
    InvalidFilter { directive: String, reason: String },

    /// A global subscriber is already installed
    #[error("tracing subscriber already installed: {0}")]
    AlreadyInstalled(String),
}

/// One reason an entry was rejected
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationIssue {
    #[error("date is required")]
    MissingDate,

    #[error("date {date} is in the future (today is {today})")]
    FutureDate { date: NaiveDate, today: NaiveDate },

    #[error("water level is required")]
    MissingLevel,

    #[error("water level must be greater than 0 (got {0})")]
    NonPositiveLevel(f64),

    #[error("rainfall cannot be negative (got {0})")]
    NegativeRainfall(f64),

    #[error("extraction cannot be negative (got {0})")]
    NegativeExtraction(f64),

    #[error("{0} must be a finite number")]
    NotFinite(&'static str),
}

/// Every distinct reason an entry was rejected, in check order
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid entry: {}", join_issues(.0))]
pub struct ValidationErrors(pub Vec<ValidationIssue>);

impl ValidationErrors {
    /// Issues as display messages
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.0.iter().map(ToString::to_string).collect()
    }

    /// Whether a specific issue was raised
    #[must_use]
    pub fn contains(&self, issue: &ValidationIssue) -> bool {
        self.0.contains(issue)
    }
}

fn join_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
