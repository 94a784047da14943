//! Rewrites resolved component source into a flat program for the frame.
//!
//! Imports are dropped (React, ReactDOM and the hooks are globals inside the
//! frame), export markers are stripped, and the source is wrapped in a
//! bootstrap that binds the entry point, mounts it under an error boundary and
//! reports the outcome.

use regex::Regex;
use std::sync::OnceLock;

use crate::identifier::Identifier;
use crate::protocol::REPORT_FN;

/// Hook-style primitives pre-bound from the frame's React global.
const HOOK_BINDINGS: &[&str] = &[
    "useState",
    "useEffect",
    "useReducer",
    "useCallback",
    "useMemo",
    "useRef",
    "useContext",
    "useLayoutEffect",
    "useId",
    "Fragment",
];

/// Error boundary and mount probe. Render faults render nothing; the probe's
/// effect runs after the first commit and reports success. `__REPORT__` is
/// replaced with [`REPORT_FN`].
const PROGRAM_PRELUDE: &str = r#"
  const __lecternContainer = document.getElementById('root');

  class __LecternErrorBoundary extends React.Component {
    constructor(props) {
      super(props);
      this.state = { failed: false };
    }
    static getDerivedStateFromError() {
      return { failed: true };
    }
    componentDidCatch(error) {
      __REPORT__('error', error, 'render');
    }
    render() {
      return this.state.failed ? null : this.props.children;
    }
  }

  function __LecternMountProbe(props) {
    useEffect(function () {
      __REPORT__('success');
    }, []);
    return props.children;
  }
"#;

fn import_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?m)^[ \t]*import[\s{*][^;'"]*?['"][^'"\n]*['"][ \t]*;?"#).unwrap()
    })
}

fn export_list_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"(?m)^[ \t]*export\s*(?:\{[^}]*\}|\*(?:\s+as\s+\w+)?)(?:\s*from\s*['"][^'"\n]*['"])?[ \t]*;?"#,
        )
        .unwrap()
    })
}

fn export_default_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\bexport\s+default\s+").unwrap())
}

fn export_declaration_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\bexport\s+(const|let|var|function|async|class)\b").unwrap())
}

fn script_close_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)</(script)").unwrap())
}

/// Strip module syntax, keeping every declaration.
///
/// `export default` markers already consumed by the resolver are gone; any left
/// here precede an expression and only the marker is dropped. The bare word
/// `default` is never touched (`default:` in a `switch` survives).
pub fn strip_module_syntax(source: &str) -> String {
    let text = import_regex().replace_all(source, "");
    let text = export_list_regex().replace_all(&text, "");
    let text = export_default_regex().replace_all(&text, "");
    export_declaration_regex()
        .replace_all(&text, "${1}")
        .into_owned()
}

/// Neutralize sequences that would end or confuse the enclosing `<script>` element.
pub fn escape_for_script(program: &str) -> String {
    script_close_regex()
        .replace_all(program, r"<\/${1}")
        .replace("<!--", r"<\!--")
}

/// Produce the flat program text for `source` (already resolved) and its entry point.
///
/// Pure: the same input always yields the same program.
pub fn rewrite(source: &str, entry: &Identifier) -> String {
    let body = strip_module_syntax(source);
    let mut program = String::with_capacity(body.len() + 2048);

    program.push_str("(function () {\n");
    program.push_str("  const { ");
    program.push_str(&HOOK_BINDINGS.join(", "));
    program.push_str(" } = React;\n");
    program.push_str(&PROGRAM_PRELUDE.replace("__REPORT__", REPORT_FN));
    program.push_str("\n  try {\n");
    program.push_str(&body);
    program.push_str("\n\n");
    push_entry_binding(&mut program, entry);
    program.push_str(&format!(
        r#"  }} catch (e) {{
    {REPORT_FN}('error', e, 'declaration');
    if (__lecternContainer) {{
      __lecternContainer.textContent = '';
    }}
  }}
}})();
"#
    ));

    escape_for_script(&program)
}

/// Binding generated once from the validated identifier; no string evaluation.
fn push_entry_binding(program: &mut String, entry: &Identifier) {
    let name = entry.as_str();
    program.push_str(&format!(
        "    const __lecternEntry = typeof {name} === 'undefined' ? undefined : {name};\n"
    ));
    program.push_str(&format!(
        "    if (typeof __lecternEntry !== 'function') {{\n      throw new Error(\"Component '{name}' could not be found or is not a function. Please ensure it is a named function or a const assigned to a function/component.\");\n    }}\n"
    ));
    program.push_str(
        r#"    ReactDOM.createRoot(__lecternContainer).render(
      React.createElement(
        __LecternErrorBoundary,
        null,
        React.createElement(__LecternMountProbe, null, React.createElement(__lecternEntry))
      )
    );
"#,
    );
}
