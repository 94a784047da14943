use lectern_artifact::{ExecutionDocument, ReportEvent};

use crate::frame::FrameId;
use crate::outcome::ExecutionOutcome;

/// What applying a report did to a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Duplicate or late event with no meaning for this session.
    Ignored,
    /// First ready signal while still loading; the grace period may start.
    Ready,
    Changed(ExecutionOutcome),
}

/// One execution document bound to one frame instance and its outcome.
///
/// Created per (re)generation and dropped on teardown; a new source or a
/// refresh always gets a new session rather than re-pointing this one.
#[derive(Debug)]
pub struct RenderSession {
    frame: FrameId,
    document: ExecutionDocument,
    outcome: ExecutionOutcome,
    ready: bool,
}

impl RenderSession {
    pub fn new(frame: FrameId, document: ExecutionDocument) -> Self {
        Self {
            frame,
            document,
            outcome: ExecutionOutcome::Loading,
            ready: false,
        }
    }

    pub fn frame(&self) -> FrameId {
        self.frame
    }

    pub fn document(&self) -> &ExecutionDocument {
        &self.document
    }

    pub fn outcome(&self) -> &ExecutionOutcome {
        &self.outcome
    }

    /// First terminal event wins. A later error still replaces success, since a
    /// mounted component can fail afterwards.
    pub fn apply(&mut self, event: &ReportEvent) -> Transition {
        match (event, &self.outcome) {
            (ReportEvent::Ready, ExecutionOutcome::Loading) if !self.ready => {
                self.ready = true;
                Transition::Ready
            }
            (ReportEvent::Success, ExecutionOutcome::Loading) => {
                self.settle(ExecutionOutcome::Success)
            }
            (ReportEvent::Error { message, stack, .. }, ExecutionOutcome::Loading)
            | (ReportEvent::Error { message, stack, .. }, ExecutionOutcome::Success) => {
                self.settle(ExecutionOutcome::Error {
                    message: message.clone(),
                    stack: stack.clone(),
                })
            }
            _ => Transition::Ignored,
        }
    }

    /// Grace period ran out after ready with nothing reported.
    pub fn infer_success(&mut self) -> Transition {
        if self.outcome.is_loading() {
            self.settle(ExecutionOutcome::Success)
        } else {
            Transition::Ignored
        }
    }

    fn settle(&mut self, outcome: ExecutionOutcome) -> Transition {
        self.outcome = outcome.clone();
        Transition::Changed(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lectern_artifact::{prepare, BoundaryOptions, FaultPhase, SessionToken};

    fn session() -> RenderSession {
        let doc = prepare(
            "export default function App() { return null; }",
            SessionToken::generate(),
            &BoundaryOptions::default(),
        )
        .unwrap();
        RenderSession::new(FrameId::generate(), doc)
    }

    fn error(message: &str) -> ReportEvent {
        ReportEvent::Error {
            message: message.to_string(),
            stack: None,
            phase: Some(FaultPhase::Render),
        }
    }

    #[test]
    fn test_starts_loading() {
        assert_eq!(session().outcome(), &ExecutionOutcome::Loading);
    }

    #[test]
    fn test_first_terminal_event_wins() {
        let mut s = session();
        assert_eq!(s.apply(&ReportEvent::Success), Transition::Changed(ExecutionOutcome::Success));
        assert_eq!(s.apply(&ReportEvent::Success), Transition::Ignored);

        let mut s = session();
        assert_eq!(
            s.apply(&error("first")),
            Transition::Changed(ExecutionOutcome::error("first"))
        );
        assert_eq!(s.apply(&error("second")), Transition::Ignored);
        assert_eq!(s.apply(&ReportEvent::Success), Transition::Ignored);
        assert_eq!(s.outcome().error_message(), Some("first"));
    }

    #[test]
    fn test_error_after_success_is_authoritative() {
        let mut s = session();
        s.apply(&ReportEvent::Success);
        assert_eq!(
            s.apply(&error("later")),
            Transition::Changed(ExecutionOutcome::error("later"))
        );
    }

    #[test]
    fn test_ready_only_counts_once_while_loading() {
        let mut s = session();
        assert_eq!(s.apply(&ReportEvent::Ready), Transition::Ready);
        assert_eq!(s.apply(&ReportEvent::Ready), Transition::Ignored);

        let mut s = session();
        s.apply(&error("boom"));
        assert_eq!(s.apply(&ReportEvent::Ready), Transition::Ignored);
    }

    #[test]
    fn test_inferred_success_only_from_loading() {
        let mut s = session();
        assert_eq!(s.infer_success(), Transition::Changed(ExecutionOutcome::Success));
        assert_eq!(s.infer_success(), Transition::Ignored);

        let mut s = session();
        s.apply(&error("boom"));
        assert_eq!(s.infer_success(), Transition::Ignored);
        assert!(s.outcome().is_error());
    }
}
