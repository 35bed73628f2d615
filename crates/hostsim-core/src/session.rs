//! Driver session - the host side of one `validate`/`get_status` run.
//!
//! Every driver run ends with exactly one report, either a success payload
//! or a failure with an error type. The session enforces that.

use crate::backup::ValidatedBackup;
use crate::error::{EmulatorError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a driver session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Create a new random session ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for SessionId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Failure categories the host understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorType {
    /// Anything without a more specific category.
    GenericError,
    /// Device output could not be parsed.
    ParsingError,
    /// Credentials were rejected.
    AuthenticationError,
    /// The device or service did not answer.
    ResourceUnavailable,
    /// Transport-level failure.
    CommunicationError,
    /// Authenticated but lacking permission.
    NotAuthorized,
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::GenericError => "GENERIC_ERROR",
            Self::ParsingError => "PARSING_ERROR",
            Self::AuthenticationError => "AUTHENTICATION_ERROR",
            Self::ResourceUnavailable => "RESOURCE_UNAVAILABLE",
            Self::CommunicationError => "COMMUNICATION_ERROR",
            Self::NotAuthorized => "NOT_AUTHORIZED",
        };
        f.write_str(name)
    }
}

/// What a session has reported so far.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SessionOutcome {
    /// No report yet.
    Pending,
    /// Driver reported success with a payload.
    Succeeded {
        /// Reported payload.
        payload: Value,
    },
    /// Driver reported failure.
    Failed {
        /// Failure category.
        error_type: ErrorType,
        /// Free-form detail.
        message: String,
    },
}

/// Host-side record of one driver run.
#[derive(Debug)]
pub struct DriverSession {
    id: SessionId,
    driver: String,
    started_at: DateTime<Utc>,
    reported_at: Option<DateTime<Utc>>,
    outcome: SessionOutcome,
}

impl DriverSession {
    /// Open a session for the named driver.
    pub fn new(driver: impl Into<String>) -> Self {
        let session = Self {
            id: SessionId::new(),
            driver: driver.into(),
            started_at: Utc::now(),
            reported_at: None,
            outcome: SessionOutcome::Pending,
        };
        tracing::debug!(session_id = %session.id, driver = %session.driver, "session opened");
        session
    }

    /// Get the session ID.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Get the driver name.
    pub fn driver(&self) -> &str {
        &self.driver
    }

    /// When the session was opened.
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// When the driver reported, if it has.
    pub fn reported_at(&self) -> Option<DateTime<Utc>> {
        self.reported_at
    }

    /// Current outcome.
    pub fn outcome(&self) -> &SessionOutcome {
        &self.outcome
    }

    /// True once a success or failure has been recorded.
    pub fn is_reported(&self) -> bool {
        !matches!(self.outcome, SessionOutcome::Pending)
    }

    /// Record a successful run.
    ///
    /// # Errors
    ///
    /// [`EmulatorError::AlreadyReported`] if the session already has a result.
    pub fn report_success(&mut self, payload: Value) -> Result<()> {
        self.record(SessionOutcome::Succeeded { payload })
    }

    /// Record a validated backup as the run's result.
    pub fn report_backup(&mut self, backup: ValidatedBackup) -> Result<()> {
        let payload = serde_json::to_value(backup)?;
        self.report_success(payload)
    }

    /// Record a failed run.
    pub fn report_failure(&mut self, error_type: ErrorType, message: impl Into<String>) -> Result<()> {
        self.record(SessionOutcome::Failed {
            error_type,
            message: message.into(),
        })
    }

    fn record(&mut self, outcome: SessionOutcome) -> Result<()> {
        if self.is_reported() {
            tracing::warn!(session_id = %self.id, driver = %self.driver, "duplicate report rejected");
            return Err(EmulatorError::AlreadyReported(self.id));
        }

        let now = Utc::now();
        tracing::info!(
            session_id = %self.id,
            driver = %self.driver,
            elapsed_ms = (now - self.started_at).num_milliseconds(),
            failed = matches!(outcome, SessionOutcome::Failed { .. }),
            "session reported"
        );
        self.reported_at = Some(now);
        self.outcome = outcome;
        Ok(())
    }
}
