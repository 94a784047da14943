//! # Lectern renderer
//!
//! Drives sandboxed artifact frames: mounts one execution document at a time
//! through a [`FrameHost`], verifies the reports each frame posts back, and
//! publishes the resulting [`ExecutionOutcome`].
//!
//! ```ignore
//! let controller = RendererController::new(RendererConfig::default().with_env_overrides(), host)
//!     .on_error(|message| eprintln!("artifact failed: {message}"));
//! let listeners = controller.listeners().clone();
//! let (handle, reports, _task) = spawn_renderer(controller);
//!
//! handle.load(ArtifactInput::new(source).with_title("Ownership")).await?;
//! // The host adapter forwards each posted message:
//! // reports.send(RawReport::new(frame, payload)).await
//! ```

pub mod channel;
pub mod config;
pub mod controller;
pub mod driver;
pub mod error;
pub mod frame;
pub mod outcome;
pub mod session;

pub use channel::{report_channel, ListenerRegistry, RawReport, ReportRejection, ReportSender};
pub use config::RendererConfig;
pub use controller::{RendererController, ViewState};
pub use driver::{spawn_renderer, RendererCommand, RendererHandle};
pub use error::{RendererError, RendererResult};
pub use frame::{FrameHost, FrameId};
pub use outcome::ExecutionOutcome;
pub use session::{RenderSession, Transition};
