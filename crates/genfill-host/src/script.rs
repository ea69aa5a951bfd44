//! Host script call convention.
//!
//! A call renders as `name("arg1","arg2")`. Each argument is escaped for a
//! double-quoted host string literal: backslashes and double quotes only. Other
//! host-script syntax inside an argument is passed through untouched, so only
//! process-generated values belong here.

use std::path::Path;

/// Script returning `"true"` when the active document has a selection.
pub const SELECTION_PROBE: &str =
    r#"try { var b = app.activeDocument.selection.bounds; "true"; } catch(e) { "false"; }"#;

/// Escape `value` for embedding inside a double-quoted host string literal.
#[must_use]
pub fn escape_argument(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Undo [`escape_argument`] the way the host's literal parser does.
#[must_use]
pub fn unescape_argument(value: &str) -> String {
    let mut raw = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            raw.push(chars.next().unwrap_or('\\'));
        } else {
            raw.push(ch);
        }
    }
    raw
}

/// A call-by-name host invocation with string arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptCall {
    function: String,
    args: Vec<String>,
}

impl ScriptCall {
    /// Call of `function` with no arguments yet.
    #[must_use]
    pub fn new(function: impl Into<String>) -> Self {
        Self {
            function: function.into(),
            args: Vec::new(),
        }
    }

    /// Append a string argument.
    #[must_use]
    pub fn arg(mut self, value: impl Into<String>) -> Self {
        self.args.push(value.into());
        self
    }

    /// Append a path argument.
    #[must_use]
    pub fn path_arg(self, path: &Path) -> Self {
        let value = path.to_string_lossy().into_owned();
        self.arg(value)
    }

    /// Name of the invoked host function.
    #[must_use]
    pub fn function(&self) -> &str {
        &self.function
    }

    /// Unescaped argument values.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Render the call as a host script string.
    #[must_use]
    pub fn render(&self) -> String {
        let args = self
            .args
            .iter()
            .map(|arg| format!("\"{}\"", escape_argument(arg)))
            .collect::<Vec<_>>()
            .join(",");
        format!("{}({args})", self.function)
    }

    /// Parse a rendered call back into its name and unescaped arguments.
    ///
    /// Returns `None` for anything [`ScriptCall::render`] would not produce.
    #[must_use]
    pub fn parse(script: &str) -> Option<Self> {
        let script = script.trim();
        let open = script.find('(')?;
        let function = script[..open].trim();
        if function.is_empty()
            || !function
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
        {
            return None;
        }
        let body = script[open + 1..].strip_suffix(')')?;

        let mut args = Vec::new();
        let mut chars = body.chars().peekable();
        loop {
            while chars.next_if(|ch| ch.is_whitespace()).is_some() {}
            match chars.next() {
                None => break,
                Some('"') => {}
                Some(_) => return None,
            }
            let mut literal = String::new();
            let mut closed = false;
            while let Some(ch) = chars.next() {
                match ch {
                    '\\' => {
                        literal.push('\\');
                        literal.push(chars.next()?);
                    }
                    '"' => {
                        closed = true;
                        break;
                    }
                    other => literal.push(other),
                }
            }
            if !closed {
                return None;
            }
            args.push(unescape_argument(&literal));
            while chars.next_if(|ch| ch.is_whitespace()).is_some() {}
            match chars.next() {
                None => break,
                Some(',') => {}
                Some(_) => return None,
            }
        }

        Some(Self {
            function: function.to_string(),
            args,
        })
    }
}
