//! # Lectern artifacts
//!
//! Turns untrusted, generated UI component source into a sealed document that
//! renders it inside a sandboxed frame.
//!
//! ## Pipeline
//! - [`resolver::resolve`]: find the entry-point component
//! - [`rewriter::rewrite`]: strip module syntax, wrap in the mount/report bootstrap
//! - [`boundary::build`]: embed the program in a self-contained document
//! - [`protocol`]: the messages the document posts back to its host
//!
//! ## Example
//! ```ignore
//! use lectern_artifact::{prepare, BoundaryOptions, SessionToken};
//!
//! let source = r#"
//! import React, { useState } from 'react';
//! export default function Counter() {
//!   const [n, setN] = useState(0);
//!   return <button onClick={() => setN(n + 1)}>{n}</button>;
//! }
//! "#;
//!
//! let doc = prepare(source, SessionToken::generate(), &BoundaryOptions::default())
//!     .expect("component should resolve");
//! assert_eq!(doc.entry().as_str(), "Counter");
//! let iframe = doc.frame_spec().to_iframe_html();
//! ```

pub mod boundary;
pub mod error;
pub mod identifier;
pub mod protocol;
pub mod resolver;
pub mod rewriter;
pub mod scan;
pub mod source;

pub use boundary::{AssetSource, BoundaryOptions, ExecutionDocument, FrameSpec, RuntimeAssets};
pub use error::{ArtifactError, ArtifactResult};
pub use identifier::Identifier;
pub use protocol::{FaultPhase, ReportEnvelope, ReportEvent, SessionToken};
pub use resolver::{ResolutionRule, ResolvedEntryPoint};
pub use source::{ArtifactInput, ComponentSource};

/// Resolve, rewrite and build in one step.
///
/// Fails before any document is built when the source is blank or no entry
/// point can be found.
pub fn prepare(
    source: &str,
    session: SessionToken,
    options: &BoundaryOptions,
) -> ArtifactResult<ExecutionDocument> {
    let resolved = resolver::resolve(source)?;
    let program = rewriter::rewrite(&resolved.rewritten_source, &resolved.name);
    boundary::build(&program, &resolved.name, session, options)
}
