// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Newtype wrappers for validated inputs.
//!
//! Every type validates its invariants at creation time, so a value that
//! exists is a value that can be used.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::HardValidationError;

/// Maximum length of framework and workload names.
const MAX_NAME_LEN: usize = 64;

/// Shared validation for identifiers: non-empty, at most 64 chars,
/// alphanumeric with hyphens/underscores.
fn validate_name(field: &'static str, name: String) -> Result<String, HardValidationError> {
    if name.is_empty() {
        return Err(HardValidationError::InvalidFieldValue {
            field,
            value: name,
            reason: "Name cannot be empty".to_string(),
        });
    }

    if name.len() > MAX_NAME_LEN {
        return Err(HardValidationError::InvalidFieldValue {
            field,
            value: name.clone(),
            reason: format!("Name too long: {} chars (max {})", name.len(), MAX_NAME_LEN),
        });
    }

    if !name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(HardValidationError::InvalidFieldValue {
            field,
            value: name,
            reason: "Name must contain only alphanumeric characters, hyphens, and underscores"
                .to_string(),
        });
    }

    Ok(name)
}

/// Validated name of a framework (system under test).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FrameworkName(String);

impl FrameworkName {
    /// Create a new FrameworkName with validation.
    pub fn new(name: impl Into<String>) -> Result<Self, HardValidationError> {
        validate_name("framework", name.into()).map(Self)
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FrameworkName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for FrameworkName {
    type Error = HardValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<FrameworkName> for String {
    fn from(name: FrameworkName) -> Self {
        name.0
    }
}

/// Validated name of a workload.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WorkloadName(String);

impl WorkloadName {
    /// Create a new WorkloadName with validation.
    pub fn new(name: impl Into<String>) -> Result<Self, HardValidationError> {
        validate_name("workload", name.into()).map(Self)
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkloadName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for WorkloadName {
    type Error = HardValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<WorkloadName> for String {
    fn from(name: WorkloadName) -> Self {
        name.0
    }
}

/// Validated network port.
/// Must be in range 1-65535 (0 is reserved).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct Port(u16);

impl Port {
    /// Create a new Port with validation.
    pub fn new(port: u16) -> Result<Self, HardValidationError> {
        if port == 0 {
            return Err(HardValidationError::InvalidPort {
                port,
                reason: "Port 0 is reserved and cannot be used".to_string(),
            });
        }
        Ok(Self(port))
    }

    /// Get the inner port value.
    pub fn value(&self) -> u16 {
        self.0
    }

    /// Base URL of a server listening on this port on the loopback interface.
    pub fn loopback_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.0)
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u16> for Port {
    type Error = HardValidationError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Port> for u16 {
    fn from(port: Port) -> Self {
        port.0
    }
}

/// Validated process ID.
/// Must be positive (non-zero).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProcessId(u32);

impl ProcessId {
    /// Create a new ProcessId with validation.
    pub fn new(pid: u32) -> Result<Self, HardValidationError> {
        if pid == 0 {
            return Err(HardValidationError::InvalidFieldValue {
                field: "process_id",
                value: "0".to_string(),
                reason: "Process ID 0 is reserved".to_string(),
            });
        }
        Ok(Self(pid))
    }

    /// Get the inner PID value.
    pub fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<ProcessId> for u32 {
    fn from(pid: ProcessId) -> Self {
        pid.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_framework_name_valid() {
        assert!(FrameworkName::new("conduit").is_ok());
        assert!(FrameworkName::new("python-fastapi").is_ok());
        assert!(FrameworkName::new("node_express_4").is_ok());
    }

    #[test]
    fn test_framework_name_invalid() {
        assert!(FrameworkName::new("").is_err());
        assert!(FrameworkName::new("a".repeat(65)).is_err());
        assert!(FrameworkName::new("Python FastAPI").is_err());
        assert!(FrameworkName::new("node.js").is_err());
    }

    #[test]
    fn test_workload_name_reports_field() {
        let err = WorkloadName::new("bad name").unwrap_err();
        assert!(err.to_string().contains("workload"));
    }

    #[test]
    fn test_framework_name_serde_rejects_invalid() {
        let ok: FrameworkName = serde_json::from_str("\"conduit\"").unwrap();
        assert_eq!(ok.as_str(), "conduit");
        assert!(serde_json::from_str::<FrameworkName>("\"has space\"").is_err());
    }

    #[test]
    fn test_port_valid() {
        assert!(Port::new(8080).is_ok());
        assert!(Port::new(1).is_ok());
        assert!(Port::new(65535).is_ok());
    }

    #[test]
    fn test_port_invalid() {
        assert!(Port::new(0).is_err());
    }

    #[test]
    fn test_port_loopback_url() {
        assert_eq!(Port::new(8080).unwrap().loopback_url(), "http://127.0.0.1:8080");
    }

    #[test]
    fn test_process_id() {
        assert!(ProcessId::new(1).is_ok());
        assert!(ProcessId::new(0).is_err());
    }
}
