// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Custom error types for conduit-bench.
//!
//! Every failure class of a benchmark run has its own explicit enum.
//! No `Box<dyn Error>`, no `anyhow::Result` in library code.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::FrameworkName;

/// Top-level error type for the harness.
#[derive(Debug, Error)]
pub enum HarnessError {
    // =========================================================================
    // Configuration Errors - Fail-Fast on Invalid Config
    // =========================================================================
    #[error("Hard validation error: {0}")]
    HardValidation(#[from] HardValidationError),

    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    #[error("Configuration parse error: {message}")]
    ConfigParse { message: String },

    // =========================================================================
    // Setup Errors - Abort Before Any Run
    // =========================================================================
    #[error("Artifact under test for {framework} not found: {path}")]
    ArtifactMissing {
        framework: FrameworkName,
        path: PathBuf,
    },

    #[error("Unknown framework profile: {name}")]
    ProfileNotFound { name: String },

    // =========================================================================
    // Run Errors - Contained to a Single Framework
    // =========================================================================
    #[error("Lifecycle error: {0}")]
    Lifecycle(#[from] LifecycleError),

    #[error("Statistics error: {0}")]
    Stats(#[from] StatsError),

    // =========================================================================
    // System Errors
    // =========================================================================
    #[error("IO error: {context} - {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
}

/// Hard validation errors reject a configuration before anything is spawned.
#[derive(Debug, Error)]
pub enum HardValidationError {
    #[error("Missing required field: {field} in {context}")]
    MissingRequiredField {
        field: &'static str,
        context: String,
    },

    #[error("Invalid field value: {field} = {value} - {reason}")]
    InvalidFieldValue {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("Invalid port: {port} - {reason}")]
    InvalidPort { port: u16, reason: String },

    #[error("Duplicate name: {name}")]
    DuplicateName { name: String },

    #[error("Schema validation failed: {message}")]
    SchemaValidation { message: String },
}

/// Process lifecycle errors.
///
/// A server that never becomes healthy is not an error: it is reported
/// through `StartOutcome::NotReady`.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Failed to spawn server process: {reason}")]
    SpawnFailed { reason: String },

    #[error("Failed to signal process {pid}: {reason}")]
    SignalFailed { pid: u32, reason: String },

    #[error("Failed to wait for process {pid}: {reason}")]
    WaitFailed { pid: u32, reason: String },

    #[error("Failed to build HTTP client: {reason}")]
    HttpClient { reason: String },
}

/// Statistics underflow. Derived metrics are undefined rather than fabricated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatsError {
    #[error("Insufficient data: {available} successful samples, at least {required} required")]
    InsufficientSamples { required: usize, available: usize },

    #[error("Invalid percentile: {0} (must be between 1 and 100)")]
    InvalidPercentile(u8),
}

/// Result type alias using HarnessError.
pub type HarnessResult<T> = Result<T, HarnessError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hard_validation_error_display() {
        let err = HardValidationError::MissingRequiredField {
            field: "command",
            context: "framework 'conduit'".to_string(),
        };
        assert!(err.to_string().contains("command"));
        assert!(err.to_string().contains("conduit"));
    }

    #[test]
    fn test_error_chain() {
        let validation_err = HardValidationError::InvalidPort {
            port: 0,
            reason: "Port must be non-zero".to_string(),
        };
        let harness_err: HarnessError = validation_err.into();
        assert!(matches!(harness_err, HarnessError::HardValidation(_)));
    }

    #[test]
    fn test_stats_error_reports_counts() {
        let err = StatsError::InsufficientSamples {
            required: 2,
            available: 1,
        };
        let message = err.to_string();
        assert!(message.contains("Insufficient data"));
        assert!(message.contains('1'));
    }
}
