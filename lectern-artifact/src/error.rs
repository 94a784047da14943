use thiserror::Error;

pub type ArtifactResult<T> = Result<T, ArtifactError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArtifactError {
    #[error("Component source is empty: nothing to render")]
    EmptySource,

    #[error("Could not find a main React component. Ensure it is a capitalized function or const, and preferably exported as default.")]
    EntryPointNotFound,

    #[error("Invalid component identifier '{name}': must start with an uppercase letter and contain only letters, digits, '_' or '$'")]
    InvalidIdentifier { name: String },

    #[error("Invalid session token '{token}'")]
    InvalidSessionToken { token: String },

    #[error("Report payload is not valid JSON: {0}")]
    MalformedReport(String),

    #[error("Report belongs to channel '{channel}', expected '{expected}'")]
    ForeignChannel { channel: String, expected: String },

    #[error("Failed to read component source '{path}': {reason}")]
    SourceUnreadable { path: String, reason: String },

    #[error("Failed to read runtime asset '{path}': {reason}")]
    AssetUnreadable { path: String, reason: String },

    #[error("Document build error: {0}")]
    DocumentBuild(String),
}

impl From<serde_json::Error> for ArtifactError {
    fn from(err: serde_json::Error) -> Self {
        ArtifactError::MalformedReport(err.to_string())
    }
}

impl From<std::fmt::Error> for ArtifactError {
    fn from(err: std::fmt::Error) -> Self {
        ArtifactError::DocumentBuild(err.to_string())
    }
}
