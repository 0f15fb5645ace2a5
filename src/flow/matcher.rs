//! Body contract evaluation.
//!
//! Checks are evaluated against the JSON-decoded response body after all
//! symbolic references in the expected values have been resolved.

use super::step::{BodyCheck, Shape};
use serde_json::{json, Value};

/// A body check that did not hold, with what was expected and what the
/// response actually contained.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Mismatch {
    pub expected: Value,
    pub actual: Value,
}

/// Evaluates one check against the response body.
pub(crate) fn check(check: &BodyCheck, body: &Value) -> Result<(), Mismatch> {
    match check {
        BodyCheck::Exact(expected) => {
            if body == expected {
                Ok(())
            } else {
                Err(Mismatch {
                    expected: expected.clone(),
                    actual: body.clone(),
                })
            }
        }
        BodyCheck::Partial(expected) => {
            if is_subset(expected, body) {
                Ok(())
            } else {
                Err(Mismatch {
                    expected: json!({ "partial": expected }),
                    actual: body.clone(),
                })
            }
        }
        BodyCheck::Shape(shape) => check_shape(*shape, body),
        BodyCheck::Element { index, expected } => {
            let element = body.as_array().and_then(|items| items.get(*index));
            match element {
                Some(element) if is_subset(expected, element) => Ok(()),
                Some(element) => Err(Mismatch {
                    expected: json!({ "element": index, "partial": expected }),
                    actual: element.clone(),
                }),
                None => Err(Mismatch {
                    expected: json!({ "element": index, "partial": expected }),
                    actual: body.clone(),
                }),
            }
        }
    }
}

/// Every key/value in `expected` must be present in `actual` with a matching
/// value, recursively for nested objects. Anything that is not an object is
/// compared by equality.
fn is_subset(expected: &Value, actual: &Value) -> bool {
    match (expected, actual) {
        (Value::Object(expected), Value::Object(actual)) => expected
            .iter()
            .all(|(key, value)| actual.get(key).is_some_and(|a| is_subset(value, a))),
        _ => expected == actual,
    }
}

fn check_shape(shape: Shape, body: &Value) -> Result<(), Mismatch> {
    let holds = match shape {
        Shape::IsArray => body.is_array(),
        Shape::HasLength(len) => match body {
            Value::Array(items) => items.len() == len,
            Value::String(s) => s.len() == len,
            _ => false,
        },
        Shape::ArrayOfLength(len) => body.as_array().is_some_and(|items| items.len() == len),
    };

    if holds {
        Ok(())
    } else {
        Err(Mismatch {
            expected: serde_json::to_value(shape).unwrap_or(Value::Null),
            actual: body.clone(),
        })
    }
}
