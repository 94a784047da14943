//! The seam between the controller and whatever actually shows frames
//! (a webview, a browser bridge, a test double).

use lectern_artifact::FrameSpec;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::RendererResult;

/// Identity of one isolated frame instance. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameId(Uuid);

impl FrameId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "frame-{}", self.0)
    }
}

/// Mounts and destroys isolated frames.
///
/// A host forwards every message a mounted frame posts as a
/// [`RawReport`](crate::channel::RawReport) tagged with the frame's id, and
/// stops doing so once the frame is unmounted.
pub trait FrameHost {
    fn mount(&self, frame: FrameId, spec: FrameSpec) -> RendererResult<()>;

    fn unmount(&self, frame: FrameId);
}

impl<T: FrameHost + ?Sized> FrameHost for Arc<T> {
    fn mount(&self, frame: FrameId, spec: FrameSpec) -> RendererResult<()> {
        (**self).mount(frame, spec)
    }

    fn unmount(&self, frame: FrameId) {
        (**self).unmount(frame)
    }
}
