//! Execution report channel: delivery from frame hosts to the controller and
//! verification of where each report came from.
//!
//! Hosts push raw posted messages, tagged with the frame that posted them,
//! into a bounded mpsc channel. A report is only accepted when its frame is
//! registered (the session is alive) and the envelope carries that frame's
//! session token. Unregistering a frame on teardown turns everything it still
//! posts into stale traffic.

use dashmap::DashMap;
use lectern_artifact::{ArtifactError, ReportEnvelope, SessionToken};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::frame::FrameId;

/// A message exactly as a frame posted it, plus the identity of the frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawReport {
    pub frame: FrameId,
    pub payload: String,
}

impl RawReport {
    pub fn new(frame: FrameId, payload: impl Into<String>) -> Self {
        Self {
            frame,
            payload: payload.into(),
        }
    }
}

pub type ReportSender = mpsc::Sender<RawReport>;
pub type ReportReceiver = mpsc::Receiver<RawReport>;

/// Create the channel frame hosts deliver reports on.
pub fn report_channel(buffer: usize) -> (ReportSender, ReportReceiver) {
    mpsc::channel(buffer.max(1))
}

/// Why a report was discarded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReportRejection {
    #[error("report from unregistered {0}")]
    UnknownFrame(FrameId),

    #[error("report from {frame} carries a foreign session token")]
    SessionMismatch { frame: FrameId },

    #[error(transparent)]
    Malformed(#[from] ArtifactError),
}

/// Live frames and the session token each one's document was built with.
#[derive(Debug, Clone, Default)]
pub struct ListenerRegistry {
    frames: Arc<DashMap<FrameId, SessionToken>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, frame: FrameId, session: SessionToken) {
        self.frames.insert(frame, session);
    }

    /// Returns true if the frame was registered.
    pub fn unregister(&self, frame: FrameId) -> bool {
        self.frames.remove(&frame).is_some()
    }

    pub fn is_registered(&self, frame: FrameId) -> bool {
        self.frames.contains_key(&frame)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Accept `report` only from a registered frame stamped with its own token.
    pub fn verify(&self, report: &RawReport) -> Result<ReportEnvelope, ReportRejection> {
        let token = self
            .frames
            .get(&report.frame)
            .map(|entry| *entry.value())
            .ok_or(ReportRejection::UnknownFrame(report.frame))?;
        let envelope = ReportEnvelope::decode(&report.payload)?;
        if !envelope.is_from(&token) {
            return Err(ReportRejection::SessionMismatch {
                frame: report.frame,
            });
        }
        Ok(envelope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lectern_artifact::ReportEvent;

    fn payload(token: SessionToken, event: ReportEvent) -> String {
        ReportEnvelope::new(token, event).encode().unwrap()
    }

    #[test]
    fn test_accepts_registered_frame_with_its_token() {
        let registry = ListenerRegistry::new();
        let frame = FrameId::generate();
        let token = SessionToken::generate();
        registry.register(frame, token);

        let envelope = registry
            .verify(&RawReport::new(frame, payload(token, ReportEvent::Success)))
            .unwrap();
        assert_eq!(envelope.event, ReportEvent::Success);
    }

    #[test]
    fn test_rejects_unknown_and_unregistered_frames() {
        let registry = ListenerRegistry::new();
        let frame = FrameId::generate();
        let token = SessionToken::generate();
        let report = RawReport::new(frame, payload(token, ReportEvent::Success));

        assert_eq!(registry.verify(&report), Err(ReportRejection::UnknownFrame(frame)));

        registry.register(frame, token);
        assert!(registry.verify(&report).is_ok());
        assert!(registry.unregister(frame));
        assert_eq!(registry.verify(&report), Err(ReportRejection::UnknownFrame(frame)));
        assert!(!registry.unregister(frame));
    }

    #[test]
    fn test_rejects_token_from_another_session() {
        let registry = ListenerRegistry::new();
        let old_frame = FrameId::generate();
        let new_frame = FrameId::generate();
        let old_token = SessionToken::generate();
        registry.register(old_frame, old_token);
        registry.register(new_frame, SessionToken::generate());

        // A frame replaying another session's message.
        let forged = RawReport::new(new_frame, payload(old_token, ReportEvent::Success));
        assert_eq!(
            registry.verify(&forged),
            Err(ReportRejection::SessionMismatch { frame: new_frame })
        );
    }

    #[test]
    fn test_rejects_malformed_payloads() {
        let registry = ListenerRegistry::new();
        let frame = FrameId::generate();
        registry.register(frame, SessionToken::generate());

        let report = RawReport::new(frame, r#"{"type":"iframeError","error":{"message":"x"}}"#);
        assert!(matches!(registry.verify(&report), Err(ReportRejection::Malformed(_))));
    }

    #[test]
    fn test_registry_clones_share_state() {
        let registry = ListenerRegistry::new();
        let shared = registry.clone();
        let frame = FrameId::generate();
        registry.register(frame, SessionToken::generate());
        assert!(shared.is_registered(frame));
        assert_eq!(shared.len(), 1);
    }
}
