//! Failure taxonomy of the action protocol.
//!
//! Nothing here is fatal to the page: every variant degrades to "no optimistic update",
//! "rollback to the last known-good envelope" or a dropped action.

use thiserror::Error;

/// Why a dispatched request did not produce a usable response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestFailure {
	/// The server answered with a non-2xx status.
	#[error("status {0}")]
	Status(u16),
	/// The request never produced a response.
	#[error("transport error: {0}")]
	Transport(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
	/// The scope envelope's payload is not a structured object.
	/// Disables prediction for the current action only.
	#[error("malformed scope envelope: {reason}")]
	MalformedEnvelope { reason: String },

	/// A prediction clause does not have the `field = expression` shape. Skipped.
	#[error("unmatched prediction clause: {clause:?}")]
	UnmatchedClause { clause: String },

	/// A trigger used a command form that is no longer supported. The action is abandoned.
	#[error("the {command:?} command is deprecated and removed, use server actions instead")]
	DeprecatedCommand { command: String },

	/// Non-2xx response or transport failure. Triggers rollback.
	#[error("action request failed: {0}")]
	RequestFailed(RequestFailure),

	/// The morph collaborator is not available. Degrades to direct outer replacement.
	#[error("morph collaborator unavailable")]
	MissingCollaborator,

	/// The owning scope already has an action in flight. Dropped, not queued.
	#[error("an action is already pending for this scope")]
	ConcurrentActionRejected,
}

impl Error {
	pub(crate) fn malformed(reason: impl ToString) -> Self {
		Self::MalformedEnvelope { reason: reason.to_string() }
	}
}

pub type Result<T, E = Error> = core::result::Result<T, E>;
