//! Component source intake: the untrusted text, the embedding view's input
//! record, and the helpers that turn raw generator output into source text.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Title shown when the embedding view does not supply one.
pub const DEFAULT_TITLE: &str = "Interactive Artifact";

/// Kind shown when the embedding view does not supply one.
pub const DEFAULT_KIND: &str = "artifact";

/// Untrusted component source text. Never mutated; every derived form is a new string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentSource(String);

impl ComponentSource {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// The text exactly as received (used by the raw-source view).
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when there is nothing but whitespace to render.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Copy with non-breaking spaces replaced by regular spaces.
    pub fn normalized(&self) -> String {
        normalize(&self.0)
    }
}

impl From<&str> for ComponentSource {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ComponentSource {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Replace U+00A0 with U+0020 so whitespace variants don't defeat pattern matching.
pub fn normalize(text: &str) -> String {
    text.replace('\u{00A0}', " ")
}

/// What the embedding view hands to the renderer. Only `source` is inspected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactInput {
    #[serde(default, alias = "reactCode")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "type")]
    pub kind: Option<String>,
}

impl ArtifactInput {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: Some(source.into()),
            title: None,
            kind: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn component_source(&self) -> Option<ComponentSource> {
        self.source.as_deref().map(ComponentSource::from)
    }

    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or(DEFAULT_TITLE)
    }

    /// Kind with underscores shown as spaces (`study_guide` -> `study guide`).
    pub fn kind_label(&self) -> String {
        self.kind.as_deref().unwrap_or(DEFAULT_KIND).replace('_', " ")
    }
}

fn fenced_jsx_regex() -> &'static Regex {
    static FENCED_JSX: OnceLock<Regex> = OnceLock::new();
    FENCED_JSX.get_or_init(|| Regex::new(r"(?s)```jsx\n(.*)```").unwrap())
}

/// Extract component code from generator output.
///
/// Takes the body of the ```` ```jsx ```` fence when there is one. Model output
/// sometimes reads `export default MyComponent() {` with no keyword; when no
/// `export default function|const` line exists, `function` is inserted so the
/// default export becomes a real declaration.
pub fn extract_component_code(response: &str) -> String {
    let code = match fenced_jsx_regex().captures(response) {
        Some(caps) => caps[1].trim().to_string(),
        None => response.trim().to_string(),
    };

    static BARE_DEFAULT: OnceLock<Regex> = OnceLock::new();
    static KEYWORD_DEFAULT: OnceLock<Regex> = OnceLock::new();
    static CALL_DEFAULT: OnceLock<Regex> = OnceLock::new();
    let bare = BARE_DEFAULT.get_or_init(|| Regex::new(r"(?m)^export default [A-Z]").unwrap());
    let keyword = KEYWORD_DEFAULT
        .get_or_init(|| Regex::new(r"(?m)^export default (?:function|const)").unwrap());
    let call = CALL_DEFAULT.get_or_init(|| {
        Regex::new(r"(?m)^(export default )([A-Z][A-Za-z0-9_]*\s*\()").unwrap()
    });

    if bare.is_match(&code) && !keyword.is_match(&code) {
        return call.replacen(&code, 1, "${1}function ${2}").into_owned();
    }
    code
}

/// PascalCase component name from a free-form title ("intro to rust" -> "IntroToRust").
pub fn component_name_from_title(title: &str) -> String {
    let mut titled = String::with_capacity(title.len());
    let mut prev_alpha = false;
    for ch in title.chars() {
        if ch.is_alphabetic() {
            if prev_alpha {
                titled.extend(ch.to_lowercase());
            } else {
                titled.extend(ch.to_uppercase());
            }
            prev_alpha = true;
        } else {
            titled.push(ch);
            prev_alpha = false;
        }
    }
    titled.retain(|c| c.is_ascii_alphanumeric());
    titled
}
