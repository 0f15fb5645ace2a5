//! Declarative building blocks of a flow: steps, expectations and captures.
//!
//! A [`Step`] is one HTTP call plus the contract its response must satisfy
//! and an optional rule for capturing part of the response into the session
//! for later steps. Steps are plain data and serialize to/from JSON so whole
//! flows can be kept in fixture files.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// HTTP methods a step can issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Patch,
    Delete,
}

impl Method {
    pub(crate) fn as_reqwest(self) -> reqwest::Method {
        match self {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

/// Structural checks on a response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    /// The body is a JSON array.
    IsArray,
    /// The body is an array or string of exactly this length.
    HasLength(usize),
    /// The body is a JSON array of exactly this length.
    ArrayOfLength(usize),
}

/// One check evaluated against the JSON-decoded response body.
///
/// Expected values are templates: they may reference captured session
/// values, so a step can assert equality against an id produced earlier in
/// the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyCheck {
    /// Deep structural equality with the whole body.
    Exact(Value),
    /// Every declared key/value must be present with a matching value,
    /// recursively for nested objects. Extra keys in the body are ignored.
    Partial(Value),
    /// Structural check, e.g. "array of length 6".
    Shape(Shape),
    /// The array element at `index` partially matches `expected`.
    Element { index: usize, expected: Value },
}

/// Where a captured value is stored in the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureTarget {
    /// Store under a symbolic name, available to later steps as `{name}`.
    Value(String),
    /// Store as the session's bearer credential.
    Credential,
}

/// Extraction of part of a response for reuse by later steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Capture {
    /// JSON pointer into the response body. `""` captures the full body,
    /// `"/accessToken"` a top-level field, `"/0/id"` a field of the first
    /// array element.
    pub pointer: String,
    pub target: CaptureTarget,
}

/// The contract a step's response must satisfy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expectation {
    /// Expected HTTP status code.
    pub status: u16,
    /// Checks evaluated against the response body, all of which must hold.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub body: Vec<BodyCheck>,
}

/// One declarative HTTP call in a flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// Identifier used in results and logs.
    pub name: String,
    pub method: Method,
    /// Path template relative to the base URL, e.g. `/orders/{orderId}`.
    pub path: String,
    /// Extra request headers; values are templates.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<(String, String)>,
    /// Attach `Authorization: Bearer <credential>` from the session.
    #[serde(default)]
    pub bearer_auth: bool,
    /// JSON request body template.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    pub expect: Expectation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capture: Option<Capture>,
}

impl Step {
    /// Creates a step expecting status 200 with no body checks.
    pub fn new(name: impl Into<String>, method: Method, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            method,
            path: path.into(),
            headers: Vec::new(),
            bearer_auth: false,
            body: None,
            expect: Expectation {
                status: 200,
                body: Vec::new(),
            },
            capture: None,
        }
    }

    pub fn get(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(name, Method::Get, path)
    }

    pub fn post(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(name, Method::Post, path)
    }

    pub fn patch(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(name, Method::Patch, path)
    }

    pub fn delete(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(name, Method::Delete, path)
    }

    /// Adds a request header; the value may reference session values.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Attaches the session's bearer credential to the request.
    pub fn with_bearer_auth(mut self) -> Self {
        self.bearer_auth = true;
        self
    }

    /// Sets the JSON request body; string values may reference session
    /// values.
    pub fn with_json_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn expect_status(mut self, status: u16) -> Self {
        self.expect.status = status;
        self
    }

    /// Requires the body to deep-equal `expected`.
    pub fn expect_exact(mut self, expected: Value) -> Self {
        self.expect.body.push(BodyCheck::Exact(expected));
        self
    }

    /// Requires every key/value in `expected` to be present in the body.
    pub fn expect_partial(mut self, expected: Value) -> Self {
        self.expect.body.push(BodyCheck::Partial(expected));
        self
    }

    pub fn expect_shape(mut self, shape: Shape) -> Self {
        self.expect.body.push(BodyCheck::Shape(shape));
        self
    }

    /// Requires the array element at `index` to partially match `expected`.
    pub fn expect_element(mut self, index: usize, expected: Value) -> Self {
        self.expect.body.push(BodyCheck::Element { index, expected });
        self
    }

    /// Captures the value at `pointer` under a symbolic name, overwriting
    /// any prior value under that name.
    pub fn capture_value(mut self, pointer: impl Into<String>, name: impl Into<String>) -> Self {
        self.capture = Some(Capture {
            pointer: pointer.into(),
            target: CaptureTarget::Value(name.into()),
        });
        self
    }

    /// Captures the string at `pointer` as the session bearer credential.
    pub fn capture_credential(mut self, pointer: impl Into<String>) -> Self {
        self.capture = Some(Capture {
            pointer: pointer.into(),
            target: CaptureTarget::Credential,
        });
        self
    }
}
