use serde::Serialize;

/// Observable result of one render attempt.
///
/// Starts as `Loading`; `Success` and `Error` are terminal for the Loading
/// phase. An `Error` may still follow `Success` when the component faults
/// after mounting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ExecutionOutcome {
    Loading,
    Success,
    Error {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        stack: Option<String>,
    },
}

impl ExecutionOutcome {
    pub fn error(message: impl Into<String>) -> Self {
        ExecutionOutcome::Error {
            message: message.into(),
            stack: None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, ExecutionOutcome::Loading)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ExecutionOutcome::Error { .. })
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            ExecutionOutcome::Error { message, .. } => Some(message),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_serialized_shape() {
        assert_eq!(
            serde_json::to_string(&ExecutionOutcome::Loading).unwrap(),
            r#"{"state":"loading"}"#
        );
        assert_eq!(
            serde_json::to_string(&ExecutionOutcome::error("Component 'App' could not be found")).unwrap(),
            r#"{"state":"error","message":"Component 'App' could not be found"}"#
        );
    }
}
