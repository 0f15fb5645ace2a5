//! Symbolic reference resolution.
//!
//! Templates reference captured session values as `{name}`. A JSON string
//! that consists of a single reference resolves to the captured value
//! itself, preserving its type; references embedded in a longer string are
//! interpolated as text. Braces that do not enclose a reference name are
//! left untouched.

use super::session::Session;
use serde_json::Value;
use thiserror::Error;

/// A template referenced something the session does not hold.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("reference to {{{0}}} before any step captured it")]
    UnresolvedReference(String),

    #[error("bearer credential required but never captured")]
    MissingCredential,
}

impl ResolveError {
    /// The symbolic name that could not be resolved.
    pub fn missing_name(&self) -> &str {
        match self {
            ResolveError::UnresolvedReference(name) => name,
            ResolveError::MissingCredential => "credential",
        }
    }
}

/// Substitutes every `{name}` reference in `template` with the captured
/// value's textual form.
pub fn resolve_str(template: &str, session: &Session) -> Result<String, ResolveError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        match after.find('}') {
            Some(end) if is_reference_name(&after[..end]) => {
                let name = &after[..end];
                let value = session
                    .get(name)
                    .ok_or_else(|| ResolveError::UnresolvedReference(name.to_string()))?;
                out.push_str(&value_to_text(value));
                rest = &after[end + 1..];
            }
            _ => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    Ok(out)
}

/// Resolves references in a JSON value, recursing into objects and arrays.
///
/// A string that is exactly one reference is replaced by the captured value
/// with its type intact, so `"{orderId}"` can stand in for a number.
pub fn resolve_value(template: &Value, session: &Session) -> Result<Value, ResolveError> {
    match template {
        Value::String(s) => {
            if let Some(name) = whole_reference(s) {
                session
                    .get(name)
                    .cloned()
                    .ok_or_else(|| ResolveError::UnresolvedReference(name.to_string()))
            } else {
                Ok(Value::String(resolve_str(s, session)?))
            }
        }
        Value::Array(items) => items
            .iter()
            .map(|item| resolve_value(item, session))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Value::Object(map) => map
            .iter()
            .map(|(key, value)| Ok((key.clone(), resolve_value(value, session)?)))
            .collect::<Result<serde_json::Map<_, _>, _>>()
            .map(Value::Object),
        other => Ok(other.clone()),
    }
}

/// Returns the reference name when the string is exactly `{name}`.
fn whole_reference(s: &str) -> Option<&str> {
    let inner = s.strip_prefix('{')?.strip_suffix('}')?;
    is_reference_name(inner).then_some(inner)
}

fn is_reference_name(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
