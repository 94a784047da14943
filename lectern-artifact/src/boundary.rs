//! Builds the sealed execution document and the frame that hosts it.
//!
//! The document carries its own UI library, JSX transform and styling runtime,
//! installs the fault interceptors before anything else runs, and talks to the
//! embedding page only through posted report messages. The frame is sandboxed
//! with `allow-scripts` alone, so the document runs at an opaque origin with no
//! access to the embedding page's cookies, storage or DOM.

use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

use crate::error::{ArtifactError, ArtifactResult};
use crate::identifier::Identifier;
use crate::protocol::{SessionToken, CHANNEL, REPORT_FN};
use crate::rewriter::escape_for_script;
use crate::source::DEFAULT_TITLE;

/// Sandbox tokens for the frame. No `allow-same-origin`, navigation, popups or forms.
pub const FRAME_SANDBOX: &str = "allow-scripts";

pub const FRAME_REFERRER_POLICY: &str = "no-referrer";

const BASE_STYLES: &str = "html,body{margin:0;min-height:100%;}\
body{background-color:transparent;color:#e2e8f0;font-family:sans-serif;}";

/// Installed first in `<head>`. Reports at most one success and one error;
/// an error after success is still reported.
const REPORT_BOOTSTRAP: &str = r#"
(function () {
  var CHANNEL = '__CHANNEL__';
  var SESSION = '__SESSION__';
  var succeeded = false;
  var failed = false;

  function describe(value) {
    if (value && typeof value === 'object') {
      return {
        message: String(value.message || value),
        stack: value.stack ? String(value.stack) : null
      };
    }
    return { message: String(value), stack: null };
  }

  function post(payload) {
    payload.channel = CHANNEL;
    payload.session = SESSION;
    try {
      window.parent.postMessage(payload, '*');
    } catch (err) {
      console.error('[artifact] report failed:', err);
    }
  }

  window.__REPORT__ = function (type, value, phase) {
    if (type === 'ready') {
      post({ type: 'ready' });
    } else if (type === 'success') {
      if (succeeded || failed) return;
      succeeded = true;
      post({ type: 'success' });
    } else if (type === 'error') {
      if (failed) return;
      failed = true;
      var info = describe(value);
      console.error('[artifact] ' + (phase || 'uncaught') + ' error:', value);
      post({ type: 'error', message: info.message, stack: info.stack, phase: phase || 'uncaught' });
    }
  };

  window.addEventListener('error', function (event) {
    window.__REPORT__('error', event.error || event.message, 'uncaught');
  });
  window.addEventListener('unhandledrejection', function (event) {
    window.__REPORT__('error', event.reason, 'async');
  });
  window.addEventListener('load', function () {
    window.__REPORT__('ready');
  });
})();
"#;

/// Where a runtime asset comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetSource {
    /// Loaded by the frame from this URL.
    Url(String),
    /// Script text embedded in the document.
    Inline(String),
    /// Script text read from disk and embedded.
    File(PathBuf),
}

impl AssetSource {
    /// Replace `File` with the file's contents.
    pub fn inlined(&self) -> ArtifactResult<AssetSource> {
        match self {
            AssetSource::File(path) => fs::read_to_string(path)
                .map(AssetSource::Inline)
                .map_err(|e| ArtifactError::AssetUnreadable {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                }),
            other => Ok(other.clone()),
        }
    }

    fn origin(&self) -> Option<String> {
        match self {
            AssetSource::Url(url) => url_origin(url),
            _ => None,
        }
    }
}

/// UI library, JSX transform and styling runtime bundled into every document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeAssets {
    pub react: AssetSource,
    pub react_dom: AssetSource,
    pub jsx_transform: AssetSource,
    pub styling: AssetSource,
}

impl Default for RuntimeAssets {
    fn default() -> Self {
        Self {
            react: AssetSource::Url(
                "https://unpkg.com/react@18/umd/react.development.js".to_string(),
            ),
            react_dom: AssetSource::Url(
                "https://unpkg.com/react-dom@18/umd/react-dom.development.js".to_string(),
            ),
            jsx_transform: AssetSource::Url(
                "https://unpkg.com/@babel/standalone/babel.min.js".to_string(),
            ),
            styling: AssetSource::Url("https://cdn.tailwindcss.com".to_string()),
        }
    }
}

impl RuntimeAssets {
    fn in_load_order(&self) -> [&AssetSource; 4] {
        [&self.react, &self.react_dom, &self.jsx_transform, &self.styling]
    }

    /// Copy with every `File` asset read into `Inline`.
    pub fn inlined(&self) -> ArtifactResult<RuntimeAssets> {
        Ok(RuntimeAssets {
            react: self.react.inlined()?,
            react_dom: self.react_dom.inlined()?,
            jsx_transform: self.jsx_transform.inlined()?,
            styling: self.styling.inlined()?,
        })
    }

    /// Inline every asset from `<dir>/{react,react-dom,babel,styling}.js`.
    pub fn from_dir(dir: impl Into<PathBuf>) -> ArtifactResult<RuntimeAssets> {
        let dir = dir.into();
        RuntimeAssets {
            react: AssetSource::File(dir.join("react.js")),
            react_dom: AssetSource::File(dir.join("react-dom.js")),
            jsx_transform: AssetSource::File(dir.join("babel.js")),
            styling: AssetSource::File(dir.join("styling.js")),
        }
        .inlined()
    }

    fn origins(&self) -> Vec<String> {
        let mut origins: Vec<String> = Vec::new();
        for origin in self.in_load_order().iter().filter_map(|a| a.origin()) {
            if !origins.contains(&origin) {
                origins.push(origin);
            }
        }
        origins
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundaryOptions {
    /// Title of the frame and its document.
    pub title: String,
    pub assets: RuntimeAssets,
}

impl Default for BoundaryOptions {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            assets: RuntimeAssets::default(),
        }
    }
}

impl BoundaryOptions {
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }
}

/// The self-contained document for one render attempt. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionDocument {
    session: SessionToken,
    entry: Identifier,
    title: String,
    program_text: String,
    html: String,
}

impl ExecutionDocument {
    pub fn session(&self) -> SessionToken {
        self.session
    }

    pub fn entry(&self) -> &Identifier {
        &self.entry
    }

    pub fn program_text(&self) -> &str {
        &self.program_text
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    /// How the embedding page hosts this document.
    pub fn frame_spec(&self) -> FrameSpec {
        FrameSpec {
            title: format!("{}: {}", DEFAULT_TITLE, self.title),
            srcdoc: self.html.clone(),
            sandbox: FRAME_SANDBOX,
            referrer_policy: FRAME_REFERRER_POLICY,
            session: self.session,
        }
    }
}

/// Description of the isolated frame, handed to a frame host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrameSpec {
    pub title: String,
    pub srcdoc: String,
    pub sandbox: &'static str,
    pub referrer_policy: &'static str,
    pub session: SessionToken,
}

impl FrameSpec {
    /// `<iframe>` element filling its container.
    pub fn to_iframe_html(&self) -> String {
        format!(
            "<iframe title=\"{}\" sandbox=\"{}\" referrerpolicy=\"{}\" style=\"width:100%;height:100%;border:0\" srcdoc=\"{}\"></iframe>",
            escape_html(&self.title),
            self.sandbox,
            self.referrer_policy,
            escape_html(&self.srcdoc)
        )
    }
}

/// Embed `program_text` in a sealed execution document for `session`.
pub fn build(
    program_text: &str,
    entry: &Identifier,
    session: SessionToken,
    options: &BoundaryOptions,
) -> ArtifactResult<ExecutionDocument> {
    let bootstrap = REPORT_BOOTSTRAP
        .replace("__REPORT__", REPORT_FN)
        .replace("__CHANNEL__", CHANNEL)
        .replace("__SESSION__", &session.to_string());

    let mut runtime = String::new();
    for asset in options.assets.in_load_order() {
        match asset.inlined()? {
            AssetSource::Url(url) => {
                writeln!(runtime, "<script src=\"{}\"></script>", escape_html(&url))?
            }
            AssetSource::Inline(text) => {
                writeln!(runtime, "<script>{}</script>", escape_for_script(&text))?
            }
            AssetSource::File(_) => {
                return Err(ArtifactError::DocumentBuild(
                    "runtime asset file was not inlined".to_string(),
                ))
            }
        }
    }

    let mut html = String::new();
    write!(
        html,
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<meta http-equiv="Content-Security-Policy" content="{}">
<title>{}</title>
<style>{}</style>
<script>{}</script>
{}</head>
<body>
<div id="root"></div>
<script type="text/babel" data-presets="react">{}</script>
</body>
</html>
"#,
        escape_html(&content_security_policy(&options.assets)),
        escape_html(&options.title),
        BASE_STYLES,
        bootstrap,
        runtime,
        escape_for_script(program_text)
    )?;

    debug!(
        session = %session,
        entry = %entry,
        bytes = html.len(),
        "built execution document"
    );

    Ok(ExecutionDocument {
        session,
        entry: entry.clone(),
        title: options.title.clone(),
        program_text: program_text.to_string(),
        html,
    })
}

/// Inline scripts plus the asset origins; no network connections, forms,
/// nested frames, plugins or base-URI changes.
pub fn content_security_policy(assets: &RuntimeAssets) -> String {
    let origins = assets.origins();
    let sources = if origins.is_empty() {
        String::new()
    } else {
        format!(" {}", origins.join(" "))
    };
    format!(
        "default-src 'none'; script-src 'unsafe-inline' 'unsafe-eval'{0}; style-src 'unsafe-inline'{0}; img-src data: blob:; font-src data:; connect-src 'none'; form-action 'none'; frame-src 'none'; object-src 'none'; base-uri 'none'",
        sources
    )
}

/// `scheme://host[:port]` of an absolute URL.
fn url_origin(url: &str) -> Option<String> {
    let (scheme, rest) = url.split_once("://")?;
    let authority = rest.split(['/', '?', '#']).next()?;
    if scheme.is_empty() || authority.is_empty() {
        return None;
    }
    Some(format!("{}://{}", scheme, authority))
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
