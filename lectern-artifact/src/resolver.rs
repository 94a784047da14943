//! Entry-point resolution: find the declaration to mount.
//!
//! Rules, first match wins:
//! 1. `export default function Name` / `export default class Name`: the
//!    `export default` marker is excised, leaving a local declaration.
//! 2. `export default Name;`: the statement is removed, the declaration kept.
//! 3. The last capitalized top-level `const`/`function` declaration.
//!
//! Anything else is [`ArtifactError::EntryPointNotFound`].

use regex::{Captures, Regex};
use serde::Serialize;
use std::sync::OnceLock;
use tracing::debug;

use crate::error::{ArtifactError, ArtifactResult};
use crate::identifier::Identifier;
use crate::scan::DepthMap;
use crate::source::normalize;

/// Which rule produced the entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionRule {
    DefaultDeclaration,
    DefaultReexport,
    LastDeclaration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEntryPoint {
    pub name: Identifier,
    /// Normalized source with the default-export marker already handled.
    pub rewritten_source: String,
    pub rule: ResolutionRule,
}

fn default_declaration_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\bexport\s+default\s+((?:async\s+)?function|class)\s+([A-Z][A-Za-z0-9_$]*)")
            .unwrap()
    })
}

fn default_reexport_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)\bexport\s+default\s+([A-Z][A-Za-z0-9_$]*)[ \t\r]*;?[ \t]*(?://[^\n]*)?$")
            .unwrap()
    })
}

fn declaration_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(?:const|function)\s+([A-Z][A-Za-z0-9_$]*)").unwrap())
}

/// Resolve the entry point of a component source.
///
/// Blank input fails with [`ArtifactError::EmptySource`] before any matching.
pub fn resolve(source: &str) -> ArtifactResult<ResolvedEntryPoint> {
    if source.trim().is_empty() {
        return Err(ArtifactError::EmptySource);
    }
    let text = normalize(source);
    let depths = DepthMap::scan(&text);

    let resolved = resolve_default_declaration(&text, &depths)
        .or_else(|| resolve_default_reexport(&text, &depths))
        .or_else(|| resolve_last_declaration(&text, &depths))
        .ok_or(ArtifactError::EntryPointNotFound)??;

    debug!(
        entry = %resolved.name,
        rule = ?resolved.rule,
        "resolved component entry point"
    );
    Ok(resolved)
}

/// First match outside comments and string literals.
fn first_in_code<'t>(re: &Regex, text: &'t str, depths: &DepthMap) -> Option<Captures<'t>> {
    re.captures_iter(text)
        .find(|caps| caps.get(0).is_some_and(|m| depths.depth_at(m.start()).is_some()))
}

fn resolve_default_declaration(
    text: &str,
    depths: &DepthMap,
) -> Option<ArtifactResult<ResolvedEntryPoint>> {
    let caps = first_in_code(default_declaration_regex(), text, depths)?;
    let whole = caps.get(0)?;
    let declaration = format!("{} {}", &caps[1], &caps[2]);

    let mut rewritten = String::with_capacity(text.len());
    rewritten.push_str(&text[..whole.start()]);
    rewritten.push_str(&declaration);
    rewritten.push_str(&text[whole.end()..]);

    Some(Identifier::parse(&caps[2]).map(|name| ResolvedEntryPoint {
        name,
        rewritten_source: rewritten,
        rule: ResolutionRule::DefaultDeclaration,
    }))
}

fn resolve_default_reexport(
    text: &str,
    depths: &DepthMap,
) -> Option<ArtifactResult<ResolvedEntryPoint>> {
    let caps = first_in_code(default_reexport_regex(), text, depths)?;
    let whole = caps.get(0)?;

    let mut rewritten = String::with_capacity(text.len());
    rewritten.push_str(&text[..whole.start()]);
    rewritten.push_str(&text[whole.end()..]);

    Some(Identifier::parse(&caps[1]).map(|name| ResolvedEntryPoint {
        name,
        rewritten_source: rewritten,
        rule: ResolutionRule::DefaultReexport,
    }))
}

/// Later declarations are more likely the main component: helpers come first.
///
/// Prefers candidates at brace depth zero; if the scan finds none there, any
/// candidate outside comments and literals; failing that, any textual match.
fn resolve_last_declaration(
    text: &str,
    depths: &DepthMap,
) -> Option<ArtifactResult<ResolvedEntryPoint>> {
    let matches: Vec<_> = declaration_regex()
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).map(|name| (caps.get(0).map_or(0, |m| m.start()), name)))
        .collect();
    if matches.is_empty() {
        return None;
    }

    let top_level = matches.iter().filter(|(at, _)| depths.is_top_level(*at)).last();
    let in_code = || matches.iter().filter(|(at, _)| depths.depth_at(*at).is_some()).last();
    let (_, name) = top_level.or_else(in_code).or_else(|| matches.last())?;

    Some(Identifier::parse(name.as_str()).map(|name| ResolvedEntryPoint {
        name,
        rewritten_source: text.to_string(),
        rule: ResolutionRule::LastDeclaration,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_function_declaration() {
        let r = resolve("export default function Foo() { return null; }").unwrap();
        assert_eq!(r.name.as_str(), "Foo");
        assert_eq!(r.rule, ResolutionRule::DefaultDeclaration);
        assert_eq!(r.rewritten_source, "function Foo() { return null; }");
    }

    #[test]
    fn test_default_async_function_and_class() {
        let r = resolve("export default async function Loader() {}").unwrap();
        assert_eq!(r.rewritten_source, "async function Loader() {}");

        let r = resolve("export default class Board extends React.Component {}").unwrap();
        assert_eq!(r.name.as_str(), "Board");
        assert_eq!(r.rewritten_source, "class Board extends React.Component {}");
    }

    #[test]
    fn test_default_declaration_beats_later_declarations() {
        let src = "export default function Main() {}\nfunction Helper() {}";
        assert_eq!(resolve(src).unwrap().name.as_str(), "Main");
    }

    #[test]
    fn test_default_reexport_removes_statement_only() {
        let src = "const Quiz = () => <div/>;\nexport default Quiz;\n";
        let r = resolve(src).unwrap();
        assert_eq!(r.name.as_str(), "Quiz");
        assert_eq!(r.rule, ResolutionRule::DefaultReexport);
        assert_eq!(r.rewritten_source, "const Quiz = () => <div/>;\n\n");
    }

    #[test]
    fn test_default_reexport_without_semicolon() {
        let r = resolve("function Card() {}\nexport default Card\n").unwrap();
        assert_eq!(r.name.as_str(), "Card");
        assert_eq!(r.rewritten_source, "function Card() {}\n\n");
    }

    #[test]
    fn test_default_reexport_with_trailing_comment() {
        let src = "const App = () => null;\nconst Helper = () => null;\nexport default App // main component\n";
        let r = resolve(src).unwrap();
        assert_eq!(r.name.as_str(), "App");
        assert_eq!(r.rule, ResolutionRule::DefaultReexport);
        assert_eq!(r.rewritten_source, "const App = () => null;\nconst Helper = () => null;\n\n");

        let r = resolve("function App() {}\nexport default App; // main\n").unwrap();
        assert_eq!(r.rule, ResolutionRule::DefaultReexport);
    }

    #[test]
    fn test_default_exports_in_comments_and_strings_are_skipped() {
        let src = "// export default function Old() {}\nfunction Current() {}\nexport default Current;\n";
        let r = resolve(src).unwrap();
        assert_eq!(r.name.as_str(), "Current");
        assert_eq!(r.rule, ResolutionRule::DefaultReexport);

        let src = "const hint = 'export default Stale;';\n/* export default function Gone() {} */\nfunction Live() {}\n";
        let r = resolve(src).unwrap();
        assert_eq!(r.name.as_str(), "Live");
        assert_eq!(r.rule, ResolutionRule::LastDeclaration);
    }

    #[test]
    fn test_default_call_expression_is_not_a_reexport() {
        let src = "const Inner = () => null;\nexport default memo(Inner);";
        let r = resolve(src).unwrap();
        assert_eq!(r.rule, ResolutionRule::LastDeclaration);
        assert_eq!(r.name.as_str(), "Inner");
    }

    #[test]
    fn test_last_declaration_wins() {
        let r = resolve("function A(){return 1} function B(){return 2}").unwrap();
        assert_eq!(r.name.as_str(), "B");
        assert_eq!(r.rule, ResolutionRule::LastDeclaration);
        assert_eq!(r.rewritten_source, "function A(){return 1} function B(){return 2}");
    }

    #[test]
    fn test_last_declaration_ignores_nested_helpers() {
        let src = "const Icon = () => <svg/>;\nfunction App() {\n  const Inner = () => <p/>;\n  return <Inner/>;\n}";
        assert_eq!(resolve(src).unwrap().name.as_str(), "App");
    }

    #[test]
    fn test_last_declaration_ignores_commented_out_code() {
        let src = "function Live() {}\n// function Dead() {}\n/* const Gone = 1; */";
        assert_eq!(resolve(src).unwrap().name.as_str(), "Live");
    }

    #[test]
    fn test_lowercase_declarations_do_not_count() {
        let src = "const helper = 1;\nfunction render() {}";
        assert_eq!(resolve(src), Err(ArtifactError::EntryPointNotFound));
    }

    #[test]
    fn test_empty_and_whitespace_sources() {
        assert_eq!(resolve(""), Err(ArtifactError::EmptySource));
        assert_eq!(resolve("  \n\t"), Err(ArtifactError::EmptySource));
        assert_eq!(resolve("\u{00A0}"), Err(ArtifactError::EmptySource));
    }

    #[test]
    fn test_nbsp_does_not_defeat_patterns() {
        let r = resolve("export\u{00A0}default\u{00A0}function\u{00A0}Wide() {}").unwrap();
        assert_eq!(r.name.as_str(), "Wide");
        assert_eq!(r.rewritten_source, "function Wide() {}");
    }

    #[test]
    fn test_resolve_is_deterministic() {
        let src = "import React from 'react';\nconst A = 1;\nexport default function B() {}";
        assert_eq!(resolve(src), resolve(src));
    }
}
