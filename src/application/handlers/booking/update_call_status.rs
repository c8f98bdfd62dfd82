//! UpdateCallStatusHandler - owner-driven call transitions.
//!
//! Applies the Call state machine for patient/mentor actions (confirm,
//! cancel, complete, no-show). Any transition outside the allowed table is
//! rejected with no state change.

use std::sync::Arc;

use crate::domain::booking::{Call, CallStatus};
use crate::domain::foundation::{CallId, DomainError, ErrorCode, UserId};
use crate::ports::{CallRepository, Clock};

/// Command to transition a call.
#[derive(Debug, Clone)]
pub struct UpdateCallStatusCommand {
    pub call_id: CallId,
    pub requested_by: UserId,
    pub target: CallStatus,
}

/// Error type for call transitions.
#[derive(Debug, Clone)]
pub enum UpdateCallStatusError {
    /// Call not found.
    CallNotFound(CallId),
    /// Requester is neither the patient nor the mentor.
    Forbidden,
    /// Transition not allowed from the current status.
    InvalidTransition(DomainError),
    /// Other domain error.
    Domain(DomainError),
}

impl std::fmt::Display for UpdateCallStatusError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UpdateCallStatusError::CallNotFound(id) => write!(f, "Call not found: {}", id),
            UpdateCallStatusError::Forbidden => {
                write!(f, "Only the patient or mentor may change this call")
            }
            UpdateCallStatusError::InvalidTransition(err) => write!(f, "{}", err),
            UpdateCallStatusError::Domain(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for UpdateCallStatusError {}

impl From<DomainError> for UpdateCallStatusError {
    fn from(err: DomainError) -> Self {
        if err.code == ErrorCode::InvalidStateTransition {
            UpdateCallStatusError::InvalidTransition(err)
        } else {
            UpdateCallStatusError::Domain(err)
        }
    }
}

/// Handler for call transitions.
pub struct UpdateCallStatusHandler {
    calls: Arc<dyn CallRepository>,
    clock: Arc<dyn Clock>,
}

impl UpdateCallStatusHandler {
    pub fn new(calls: Arc<dyn CallRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { calls, clock }
    }

    pub async fn handle(
        &self,
        cmd: UpdateCallStatusCommand,
    ) -> Result<Call, UpdateCallStatusError> {
        // 1. Load the call.
        let mut call = self
            .calls
            .find_by_id(&cmd.call_id)
            .await?
            .ok_or(UpdateCallStatusError::CallNotFound(cmd.call_id))?;

        // 2. Only the owning parties may mutate it.
        if cmd.requested_by != call.patient_id && cmd.requested_by != call.mentor_id {
            return Err(UpdateCallStatusError::Forbidden);
        }

        // 3. Validated transition; rejection leaves the row untouched.
        call.transition(cmd.target, self.clock.now())?;

        // 4. Persist.
        self.calls.update(&call).await?;
        Ok(call)
    }
}
