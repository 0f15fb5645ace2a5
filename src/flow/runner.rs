//! Ordered execution of flow steps against a live endpoint.

use super::matcher::{self, Mismatch};
use super::result::{FailureKind, StepFailure, StepResult};
use super::session::Session;
use super::step::{BodyCheck, Capture, CaptureTarget, Step};
use super::template::{resolve_str, resolve_value, ResolveError};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Executes steps in declaration order against a base URL.
///
/// Each run threads a [`Session`] through the steps: captures from earlier
/// responses resolve references in later requests. `run` never fails as a
/// whole; every step produces a [`StepResult`] and failures are recorded in
/// it, so one failing step does not hide the outcome of the others.
pub struct FlowRunner {
    client: reqwest::Client,
    base_url: String,
}

impl FlowRunner {
    /// Create a new runner.
    ///
    /// # Arguments
    /// * `base_url` - Base URL of the API under test (e.g., "http://localhost:8080")
    pub fn new(base_url: impl Into<String>) -> Self {
        // Ensure base_url doesn't have trailing slash
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    /// Replaces the transport's default timeout with a per-request one.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");
        self
    }

    /// Runs the steps with a fresh, empty session.
    pub async fn run(&self, steps: &[Step]) -> Vec<StepResult> {
        self.run_with_session(steps, Session::new()).await
    }

    /// Runs the steps with a caller-seeded session, one at a time in
    /// declaration order. The session is discarded when the run completes.
    pub async fn run_with_session(&self, steps: &[Step], mut session: Session) -> Vec<StepResult> {
        let mut results = Vec::with_capacity(steps.len());

        for step in steps {
            let result = self.execute_step(step, &mut session).await;
            if result.passed {
                info!("step '{}' passed", result.name);
            } else {
                warn!("step '{}' failed: {:?}", result.name, result.failures);
            }
            results.push(result);
        }

        results
    }

    async fn execute_step(&self, step: &Step, session: &mut Session) -> StepResult {
        let mut failures = Vec::new();

        let request = match self.resolve_request(step, session) {
            Ok(request) => request,
            Err(err) => {
                failures.push(unresolved_failure(&err));
                return StepResult::new(&step.name, failures);
            }
        };

        debug!("{} {}", step.method, request.url);
        let mut builder = self.client.request(step.method.as_reqwest(), &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(err) => {
                failures.push(StepFailure::new(
                    FailureKind::Transport,
                    json!("response"),
                    json!(err.to_string()),
                ));
                return StepResult::new(&step.name, failures);
            }
        };

        let status = response.status().as_u16();
        if status != step.expect.status {
            failures.push(StepFailure::new(
                FailureKind::StatusMismatch,
                json!(step.expect.status),
                json!(status),
            ));
        }

        // Empty (204) and non-JSON bodies check and capture as null.
        let body = response.json::<Value>().await.unwrap_or(Value::Null);

        for check in &step.expect.body {
            match resolve_check(check, session) {
                Ok(check) => {
                    if let Err(Mismatch { expected, actual }) = matcher::check(&check, &body) {
                        failures.push(StepFailure::new(
                            FailureKind::BodyMismatch,
                            expected,
                            actual,
                        ));
                    }
                }
                Err(err) => failures.push(unresolved_failure(&err)),
            }
        }

        if let Some(capture) = &step.capture {
            if let Err(failure) = apply_capture(capture, &body, session) {
                failures.push(failure);
            }
        }

        StepResult::new(&step.name, failures)
    }

    fn resolve_request(
        &self,
        step: &Step,
        session: &Session,
    ) -> Result<ResolvedRequest, ResolveError> {
        let path = resolve_str(&step.path, session)?;
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));

        let headers = step
            .headers
            .iter()
            .map(|(name, value)| Ok((name.clone(), resolve_str(value, session)?)))
            .collect::<Result<Vec<_>, ResolveError>>()?;

        let bearer = if step.bearer_auth {
            let token = session
                .credential()
                .ok_or(ResolveError::MissingCredential)?;
            Some(token.to_string())
        } else {
            None
        };

        let body = step
            .body
            .as_ref()
            .map(|body| resolve_value(body, session))
            .transpose()?;

        Ok(ResolvedRequest {
            url,
            headers,
            bearer,
            body,
        })
    }

    /// Get the base URL the runner targets.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// A step's request with every symbolic reference substituted.
#[derive(Debug)]
struct ResolvedRequest {
    url: String,
    headers: Vec<(String, String)>,
    bearer: Option<String>,
    body: Option<Value>,
}

/// Expected bodies are templates too, so a check can assert against a value
/// captured earlier in the run.
fn resolve_check(check: &BodyCheck, session: &Session) -> Result<BodyCheck, ResolveError> {
    Ok(match check {
        BodyCheck::Exact(expected) => BodyCheck::Exact(resolve_value(expected, session)?),
        BodyCheck::Partial(expected) => BodyCheck::Partial(resolve_value(expected, session)?),
        BodyCheck::Shape(shape) => BodyCheck::Shape(*shape),
        BodyCheck::Element { index, expected } => BodyCheck::Element {
            index: *index,
            expected: resolve_value(expected, session)?,
        },
    })
}

fn apply_capture(
    capture: &Capture,
    body: &Value,
    session: &mut Session,
) -> Result<(), StepFailure> {
    let value = body.pointer(&capture.pointer).ok_or_else(|| {
        StepFailure::new(
            FailureKind::Capture,
            json!(capture.pointer),
            body.clone(),
        )
    })?;

    match &capture.target {
        CaptureTarget::Value(name) => session.set(name.clone(), value.clone()),
        CaptureTarget::Credential => match value.as_str() {
            Some(token) => session.set_credential(token),
            None => {
                return Err(StepFailure::new(
                    FailureKind::Capture,
                    json!(capture.pointer),
                    value.clone(),
                ))
            }
        },
    }

    Ok(())
}

fn unresolved_failure(err: &ResolveError) -> StepFailure {
    StepFailure::new(
        FailureKind::UnresolvedReference,
        json!(err.missing_name()),
        Value::Null,
    )
}
