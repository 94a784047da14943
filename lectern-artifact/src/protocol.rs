//! Wire format of the execution report channel.
//!
//! Every message posted out of the isolated frame is a JSON object carrying the
//! channel name, the session token baked into the document, and one event.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::{ArtifactError, ArtifactResult};

/// Channel name stamped on every report; anything else is foreign traffic.
pub const CHANNEL: &str = "lectern-artifact";

/// Global function the document installs for reporting. The generated program calls it.
pub const REPORT_FN: &str = "__lecternReport";

/// Unguessable per-session token embedded into one execution document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(Uuid);

impl SessionToken {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(token: &str) -> ArtifactResult<Self> {
        Uuid::parse_str(token)
            .map(Self)
            .map_err(|_| ArtifactError::InvalidSessionToken {
                token: token.to_string(),
            })
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where inside the frame a fault was observed. Informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultPhase {
    /// Defining top-level declarations or binding the entry point.
    Declaration,
    /// Caught by the error boundary during render/update.
    Render,
    /// Unhandled promise rejection.
    Async,
    /// Anything the `error` interceptor saw, including transform errors.
    Uncaught,
}

/// Events the frame reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReportEvent {
    /// The frame finished loading; starts the grace period.
    Ready,
    /// The component committed without any fault.
    Success,
    Error {
        message: String,
        #[serde(default)]
        stack: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        phase: Option<FaultPhase>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportEnvelope {
    pub channel: String,
    pub session: String,
    #[serde(flatten)]
    pub event: ReportEvent,
}

impl ReportEnvelope {
    pub fn new(session: SessionToken, event: ReportEvent) -> Self {
        Self {
            channel: CHANNEL.to_string(),
            session: session.to_string(),
            event,
        }
    }

    /// Decode a posted message. Rejects malformed JSON and other channels.
    pub fn decode(payload: &str) -> ArtifactResult<Self> {
        let envelope: ReportEnvelope = serde_json::from_str(payload)?;
        if envelope.channel != CHANNEL {
            return Err(ArtifactError::ForeignChannel {
                channel: envelope.channel,
                expected: CHANNEL.to_string(),
            });
        }
        Ok(envelope)
    }

    pub fn encode(&self) -> ArtifactResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// True if this envelope was stamped with `token`.
    pub fn is_from(&self, token: &SessionToken) -> bool {
        SessionToken::parse(&self.session).is_ok_and(|t| t == *token)
    }
}
