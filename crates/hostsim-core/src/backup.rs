//! Configuration backup validation.
//!
//! Drivers hand the host a running (and optionally startup) configuration
//! blob. The host only accepts the canonical [`ValidatedBackup`] shape.

use crate::error::{EmulatorError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Maximum size of a configuration blob, in UTF-16 code units (1 Mi).
pub const MAX_BACKUP_SIZE: usize = 1024 * 1024;

/// Label used when the driver does not supply one.
pub const DEFAULT_BACKUP_LABEL: &str = "Custom Driver Configuration Backup";

/// Result type tag the host uses to recognise payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultKind {
    /// A configuration backup.
    Backup,
}

/// Driver-supplied backup payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigurationBackup {
    /// Display label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Live configuration.
    pub running: String,
    /// Persisted boot configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub startup: Option<String>,
}

impl ConfigurationBackup {
    /// Create a backup with only a running configuration.
    pub fn new(running: impl Into<String>) -> Self {
        Self {
            running: running.into(),
            ..Self::default()
        }
    }

    /// Set the display label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the startup configuration.
    pub fn with_startup(mut self, startup: impl Into<String>) -> Self {
        self.startup = Some(startup.into());
        self
    }

    /// Validate into the canonical shape.
    ///
    /// Same size rules as [`create_backup`]; type checks are already
    /// guaranteed by the struct.
    pub fn validate(self) -> Result<ValidatedBackup> {
        check_size("running", &self.running)?;
        if let Some(startup) = &self.startup {
            check_size("startup", startup)?;
        }
        Ok(ValidatedBackup {
            label: self
                .label
                .unwrap_or_else(|| DEFAULT_BACKUP_LABEL.to_string()),
            running: self.running,
            startup: self.startup,
            kind: ResultKind::Backup,
        })
    }
}

/// Canonical backup accepted by the host for storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatedBackup {
    /// Display label, defaulted when absent.
    pub label: String,
    /// Live configuration, verbatim.
    pub running: String,
    /// Boot configuration, `null` when not supplied.
    pub startup: Option<String>,
    /// Always [`ResultKind::Backup`].
    #[serde(rename = "type")]
    pub kind: ResultKind,
}

/// Validate an untyped backup payload.
///
/// Checks run in a fixed order and the first failure wins:
///
/// 1. the input must be present and not `null`;
/// 2. `label` is taken when it is a string, otherwise defaulted;
/// 3. `running` must be a string;
/// 4. `running` must fit in [`MAX_BACKUP_SIZE`] UTF-16 code units;
/// 5. `startup` may be absent or `null`, otherwise it must be a string that
///    fits the same cap.
///
/// # Errors
///
/// [`EmulatorError::InvalidArgument`] for missing or wrong-typed fields,
/// [`EmulatorError::SizeExceeded`] for oversized blobs.
pub fn create_backup(input: Option<&Value>) -> Result<ValidatedBackup> {
    let input = match input {
        None | Some(Value::Null) => {
            tracing::warn!("backup rejected: no payload");
            return Err(EmulatorError::invalid("backup payload is required"));
        }
        Some(input) => input,
    };

    let label = input
        .get("label")
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_BACKUP_LABEL)
        .to_string();

    let Some(running) = input.get("running").and_then(Value::as_str) else {
        tracing::warn!("backup rejected: running is missing or not a string");
        return Err(EmulatorError::invalid(
            "running configuration must be a string",
        ));
    };
    check_size("running", running)?;

    let startup = match input.get("startup") {
        None | Some(Value::Null) => None,
        Some(Value::String(startup)) => {
            check_size("startup", startup)?;
            Some(startup.clone())
        }
        Some(other) => {
            tracing::warn!(startup = ?other, "backup rejected: startup is not a string");
            return Err(EmulatorError::invalid(
                "startup configuration must be a string",
            ));
        }
    };

    tracing::debug!(
        label = %label,
        running_len = running.len(),
        has_startup = startup.is_some(),
        "backup validated"
    );

    Ok(ValidatedBackup {
        label,
        running: running.to_string(),
        startup,
        kind: ResultKind::Backup,
    })
}

fn check_size(field: &'static str, value: &str) -> Result<()> {
    // Lengths are UTF-16 code units, as the platform counts them. The UTF-8
    // byte length bounds that count from above.
    if value.len() <= MAX_BACKUP_SIZE {
        return Ok(());
    }
    let len = value.encode_utf16().count();
    if len > MAX_BACKUP_SIZE {
        tracing::warn!(field, len, max = MAX_BACKUP_SIZE, "backup rejected: too large");
        return Err(EmulatorError::SizeExceeded {
            field,
            len,
            max: MAX_BACKUP_SIZE,
        });
    }
    Ok(())
}
