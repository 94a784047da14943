//! Async task owning a [`RendererController`].
//!
//! The task waits on three things only: commands from the embedding view,
//! reports from the frame host and the armed grace deadline.

use lectern_artifact::ArtifactInput;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info};

use crate::channel::{report_channel, ReportSender};
use crate::controller::RendererController;
use crate::error::{RendererError, RendererResult};
use crate::frame::FrameHost;
use crate::outcome::ExecutionOutcome;

const COMMAND_BUFFER: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RendererCommand {
    Load(ArtifactInput),
    Refresh,
    Unmount,
    Shutdown,
}

/// Cloneable handle to a running renderer task.
#[derive(Debug, Clone)]
pub struct RendererHandle {
    commands: mpsc::Sender<RendererCommand>,
    outcome: watch::Receiver<Option<ExecutionOutcome>>,
}

impl RendererHandle {
    pub async fn load(&self, input: ArtifactInput) -> RendererResult<()> {
        self.send(RendererCommand::Load(input)).await
    }

    pub async fn refresh(&self) -> RendererResult<()> {
        self.send(RendererCommand::Refresh).await
    }

    pub async fn unmount(&self) -> RendererResult<()> {
        self.send(RendererCommand::Unmount).await
    }

    /// Tear down and stop the task.
    pub async fn shutdown(&self) -> RendererResult<()> {
        self.send(RendererCommand::Shutdown).await
    }

    pub fn outcome(&self) -> Option<ExecutionOutcome> {
        self.outcome.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<ExecutionOutcome>> {
        self.outcome.clone()
    }

    async fn send(&self, command: RendererCommand) -> RendererResult<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| RendererError::Stopped)
    }
}

/// Run `controller` on a new task.
///
/// Returns the handle, the sender frame hosts push reports into, and the task,
/// which yields the torn-down controller once shut down (or once every handle
/// is dropped).
pub fn spawn_renderer<H>(
    mut controller: RendererController<H>,
) -> (RendererHandle, ReportSender, JoinHandle<RendererController<H>>)
where
    H: FrameHost + Send + 'static,
{
    let (command_tx, mut commands) = mpsc::channel(COMMAND_BUFFER);
    let (report_tx, mut reports) = report_channel(controller.config().report_buffer);
    let handle = RendererHandle {
        commands: command_tx,
        outcome: controller.subscribe(),
    };

    let task = tokio::spawn(async move {
        info!("renderer task started");
        loop {
            let deadline = controller.grace_deadline();
            let wake_at = deadline.map(|(_, at)| at).unwrap_or_else(Instant::now);
            tokio::select! {
                command = commands.recv() => {
                    match command {
                        Some(RendererCommand::Load(input)) => controller.load(input),
                        Some(RendererCommand::Refresh) => controller.refresh(),
                        Some(RendererCommand::Unmount) => controller.unmount(),
                        Some(RendererCommand::Shutdown) | None => break,
                    }
                }
                Some(report) = reports.recv() => {
                    controller.handle_report(&report);
                }
                _ = sleep_until(wake_at), if deadline.is_some() => {
                    if let Some((frame, _)) = deadline {
                        controller.on_grace_elapsed(frame);
                    }
                }
            }
        }
        controller.unmount();
        debug!("renderer task stopped");
        controller
    });

    (handle, report_tx, task)
}
