//! Argument model — raw tokens to immutable key/value pairs.

use std::fmt;

/// Rendering variant of an [`Argument`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentKind {
    /// Rendered as `key` or `key=value`. Multiple values per key are allowed.
    Plain,
    /// Rendered as `-Dkey=value` (or `-Dkey` without a value). At most one
    /// value per key.
    SystemProperty,
}

/// A single command-line token in a possible key/value pair.
///
/// Immutable once constructed. A system-property argument's identity is
/// always the bare property name: a leading `-D` on the key is stripped at
/// construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argument {
    kind: ArgumentKind,
    key: String,
    value: Option<String>,
}

impl Argument {
    /// Parse a raw token. Never fails: every input maps to some argument.
    ///
    /// A `-D` prefix selects the system-property variant; the remainder (or
    /// the whole token) splits on the first `=`. A trailing `=` yields an
    /// absent value, not an empty one.
    pub fn parse(raw: &str) -> Self {
        if let Some(stripped) = raw.strip_prefix("-D") {
            let (key, value) = split_token(stripped);
            Self::system_property(key, value)
        } else {
            let (key, value) = split_token(raw);
            Self::plain(key, value)
        }
    }

    /// A plain argument.
    pub fn plain(key: &str, value: Option<&str>) -> Self {
        Self {
            kind: ArgumentKind::Plain,
            key: key.to_string(),
            value: value.map(str::to_string),
        }
    }

    /// A system-property argument. A leading `-D` on `key` is stripped so
    /// identity is the bare property name.
    pub fn system_property(key: &str, value: Option<&str>) -> Self {
        let key = key.strip_prefix("-D").unwrap_or(key);
        Self {
            kind: ArgumentKind::SystemProperty,
            key: key.to_string(),
            value: value.map(str::to_string),
        }
    }

    pub fn kind(&self) -> ArgumentKind {
        self.kind
    }

    /// The key, which may be the full token for separator-less input.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The optional value. Absent is distinct from an empty string and both
    /// are preserved through re-rendering.
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// Whether the collection may hold several values under this key. System
    /// properties are single-valued; plain arguments accumulate.
    pub fn multiple_values_allowed(&self) -> bool {
        matches!(self.kind, ArgumentKind::Plain)
    }

    /// The argument formatted for the command line.
    pub fn as_command_line(&self) -> String {
        match (self.kind, &self.value) {
            (ArgumentKind::Plain, Some(value)) => format!("{}={value}", self.key),
            (ArgumentKind::Plain, None) => self.key.clone(),
            (ArgumentKind::SystemProperty, Some(value)) => format!("-D{}={value}", self.key),
            (ArgumentKind::SystemProperty, None) => format!("-D{}", self.key),
        }
    }
}

impl fmt::Display for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_command_line())
    }
}

/// Split on the first `=`. A trailing `=` maps to an absent value.
fn split_token(raw: &str) -> (&str, Option<&str>) {
    match raw.split_once('=') {
        Some((key, "")) => (key, None),
        Some((key, value)) => (key, Some(value)),
        None => (raw, None),
    }
}
