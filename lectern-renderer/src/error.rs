use lectern_artifact::ArtifactError;
use thiserror::Error;

pub type RendererResult<T> = Result<T, RendererError>;

#[derive(Error, Debug)]
pub enum RendererError {
    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    #[error("Frame host could not mount frame {frame}: {reason}")]
    FrameMount { frame: String, reason: String },

    #[error("Invalid renderer config: {0}")]
    Config(String),

    #[error("Failed to read config '{path}': {reason}")]
    ConfigUnreadable { path: String, reason: String },

    #[error("Renderer task has stopped")]
    Stopped,
}

impl From<serde_yaml::Error> for RendererError {
    fn from(err: serde_yaml::Error) -> Self {
        RendererError::Config(err.to_string())
    }
}
