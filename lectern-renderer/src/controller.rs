//! Render lifecycle: one session at a time, `Idle -> Loading -> {Success, Error}`.
//!
//! The controller is synchronous. It is driven by the async task in
//! [`crate::driver`], or directly by an embedding that owns its own loop.

use lectern_artifact::{prepare, ArtifactInput, ReportEvent, SessionToken};
use serde::Serialize;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::channel::{ListenerRegistry, RawReport};
use crate::config::RendererConfig;
use crate::frame::{FrameHost, FrameId};
use crate::outcome::ExecutionOutcome;
use crate::session::{RenderSession, Transition};

/// Called with the message each time the outcome moves into `Error`.
pub type ErrorCallback = Box<dyn Fn(&str) + Send + Sync>;

/// Display flags. Neither affects execution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ViewState {
    pub fullscreen: bool,
    pub show_source: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct GraceDeadline {
    frame: FrameId,
    at: Instant,
}

pub struct RendererController<H> {
    config: RendererConfig,
    host: H,
    listeners: ListenerRegistry,
    input: Option<ArtifactInput>,
    session: Option<RenderSession>,
    /// `None` while idle.
    outcome: watch::Sender<Option<ExecutionOutcome>>,
    on_error: Option<ErrorCallback>,
    view: ViewState,
    grace: Option<GraceDeadline>,
}

impl<H: FrameHost> RendererController<H> {
    pub fn new(config: RendererConfig, host: H) -> Self {
        let (outcome, _) = watch::channel(None);
        Self {
            config,
            host,
            listeners: ListenerRegistry::new(),
            input: None,
            session: None,
            outcome,
            on_error: None,
            view: ViewState::default(),
            grace: None,
        }
    }

    /// Share a registry with the frame host adapter.
    pub fn with_listeners(mut self, listeners: ListenerRegistry) -> Self {
        self.listeners = listeners;
        self
    }

    pub fn on_error(mut self, callback: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Box::new(callback));
        self
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn listeners(&self) -> &ListenerRegistry {
        &self.listeners
    }

    pub fn session(&self) -> Option<&RenderSession> {
        self.session.as_ref()
    }

    pub fn current_frame(&self) -> Option<FrameId> {
        self.session.as_ref().map(RenderSession::frame)
    }

    /// Current outcome; `None` while idle.
    pub fn outcome(&self) -> Option<ExecutionOutcome> {
        self.outcome.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<ExecutionOutcome>> {
        self.outcome.subscribe()
    }

    /// Render new source, replacing whatever is mounted.
    pub fn load(&mut self, input: ArtifactInput) {
        self.input = Some(input);
        self.start_session();
    }

    /// Re-run the current source in a fresh frame. No-op while idle.
    pub fn refresh(&mut self) {
        if self.input.is_none() {
            debug!("refresh ignored: nothing loaded");
            return;
        }
        self.start_session();
    }

    /// Tear down and return to idle.
    pub fn unmount(&mut self) {
        self.teardown();
        self.input = None;
        self.publish(None);
    }

    /// Apply one report from a frame host. Reports that fail verification or
    /// come from a frame other than the current one are dropped.
    pub fn handle_report(&mut self, report: &RawReport) -> Transition {
        let envelope = match self.listeners.verify(report) {
            Ok(envelope) => envelope,
            Err(rejection) => {
                warn!(%rejection, "discarding report");
                return Transition::Ignored;
            }
        };
        let Some(session) = self.session.as_mut() else {
            return Transition::Ignored;
        };
        if session.frame() != report.frame {
            debug!(frame = %report.frame, "discarding report from stale frame");
            return Transition::Ignored;
        }

        if let ReportEvent::Error { message, phase, .. } = &envelope.event {
            warn!(frame = %report.frame, ?phase, message = %message, "artifact reported a fault");
        }

        let transition = session.apply(&envelope.event);
        match &transition {
            Transition::Ready => self.arm_grace(report.frame),
            Transition::Changed(outcome) => {
                self.grace = None;
                self.publish(Some(outcome.clone()));
            }
            Transition::Ignored => {
                debug!(frame = %report.frame, event = ?envelope.event, "report had no effect")
            }
        }
        transition
    }

    /// The armed grace deadline, if any, and the frame it belongs to.
    pub fn grace_deadline(&self) -> Option<(FrameId, Instant)> {
        self.grace.map(|g| (g.frame, g.at))
    }

    /// Infer success for `frame` if its grace period ran out while loading.
    pub fn on_grace_elapsed(&mut self, frame: FrameId) -> Transition {
        match self.grace {
            Some(grace) if grace.frame == frame => self.grace = None,
            _ => return Transition::Ignored,
        }
        let Some(session) = self.session.as_mut().filter(|s| s.frame() == frame) else {
            return Transition::Ignored;
        };
        let transition = session.infer_success();
        if let Transition::Changed(outcome) = &transition {
            debug!(%frame, "no report within grace period, inferring success");
            self.publish(Some(outcome.clone()));
        }
        transition
    }

    pub fn view(&self) -> ViewState {
        self.view
    }

    pub fn toggle_fullscreen(&mut self) -> bool {
        self.view.fullscreen = !self.view.fullscreen;
        self.view.fullscreen
    }

    pub fn toggle_source(&mut self) -> bool {
        self.view.show_source = !self.view.show_source;
        self.view.show_source
    }

    /// The loaded source exactly as received. Never executed.
    pub fn source_view(&self) -> Option<&str> {
        self.input.as_ref().and_then(|input| input.source.as_deref())
    }

    fn start_session(&mut self) {
        self.teardown();
        let Some(input) = self.input.as_ref() else {
            return;
        };

        let source = input.component_source().unwrap_or_default();
        let kind = input.kind_label();
        // The input's own title wins over the configured one.
        let title = input.title.as_deref().unwrap_or(&self.config.boundary.title);
        let options = self.config.boundary.clone().with_title(title);
        let document = match prepare(source.as_str(), SessionToken::generate(), &options) {
            Ok(document) => document,
            Err(e) => {
                warn!(error = %e, "artifact rejected before mounting");
                self.publish(Some(ExecutionOutcome::error(e.to_string())));
                return;
            }
        };

        let frame = FrameId::generate();
        // Registered before mounting so reports posted during mount are kept.
        self.listeners.register(frame, document.session());
        if let Err(e) = self.host.mount(frame, document.frame_spec()) {
            self.listeners.unregister(frame);
            warn!(%frame, error = %e, "frame host failed to mount");
            self.publish(Some(ExecutionOutcome::error(e.to_string())));
            return;
        }

        info!(
            %frame,
            %kind,
            entry = %document.entry(),
            bytes = document.html().len(),
            "mounted artifact frame"
        );
        self.session = Some(RenderSession::new(frame, document));
        self.publish(Some(ExecutionOutcome::Loading));
    }

    fn teardown(&mut self) {
        self.grace = None;
        if let Some(session) = self.session.take() {
            let frame = session.frame();
            self.listeners.unregister(frame);
            self.host.unmount(frame);
            info!(%frame, "unmounted artifact frame");
        }
    }

    fn arm_grace(&mut self, frame: FrameId) {
        if let Some(period) = self.config.grace_period() {
            self.grace = Some(GraceDeadline {
                frame,
                at: Instant::now() + period,
            });
        }
    }

    fn publish(&mut self, outcome: Option<ExecutionOutcome>) {
        if let (Some(ExecutionOutcome::Error { message, .. }), Some(callback)) =
            (&outcome, &self.on_error)
        {
            callback(message);
        }
        self.outcome.send_replace(outcome);
    }
}
