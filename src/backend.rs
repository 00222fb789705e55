//! Backend collaborator boundary.
//!
//! The session talks to the assessment backend through the narrow `Backend`
//! trait: one task fetch, one answer submission, fire-and-forget telemetry.
//! `HttpBackend` is the production JSON-over-HTTP implementation;
//! `MockBackend` is an in-process double for unit and integration tests.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::metrics::BehaviorMetrics;

/// Task fetch response, as served by the backend.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResponse {
    pub task: TaskFields,
    pub skill_session_id: String,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskFields {
    pub task_name: String,
    pub task_description: String,
}

/// Final answer body, keyed by the attempt-scoped session id.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionBody {
    pub explanation: String,
    pub behavior_metrics: BehaviorMetrics,
    pub snapshots: Vec<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The backend answered with a failure status; the message is the
    /// server-provided error when one was present.
    #[error("{message}")]
    Status { code: u16, message: String },

    #[error("network error: {0}")]
    Transport(String),

    #[error("malformed response: {0}")]
    Decode(#[from] std::io::Error),
}

/// Narrow contract against the external assessment backend.
pub trait Backend {
    /// Fetch the personalized task and the attempt session id. One-shot.
    fn fetch_task(&self, test_link: &str, session_id: &str) -> Result<TaskResponse, BackendError>;

    /// Hand over the final submission. The caller decides what to do with
    /// failures; the candidate is never blocked on this call's outcome.
    fn submit_answer(
        &self,
        skill_session_id: &str,
        body: &SubmissionBody,
    ) -> Result<(), BackendError>;

    /// Fire-and-forget telemetry notification keyed by the test link.
    fn send_event(
        &self,
        test_link: &str,
        event_type: &str,
        payload: Value,
    ) -> Result<(), BackendError>;
}

/// Production backend over blocking HTTP.
pub struct HttpBackend {
    agent: ureq::Agent,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(30))
            .build();
        Self {
            agent,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn post(&self, path: &str, body: impl Serialize) -> Result<ureq::Response, BackendError> {
        let url = format!("{}{}", self.base_url, path);
        match self.agent.post(&url).send_json(body) {
            Ok(resp) => Ok(resp),
            Err(ureq::Error::Status(code, resp)) => {
                let message = resp
                    .into_json::<ErrorBody>()
                    .map(|b| b.error)
                    .unwrap_or_else(|_| format!("request failed with status {code}"));
                Err(BackendError::Status { code, message })
            }
            Err(ureq::Error::Transport(t)) => Err(BackendError::Transport(t.to_string())),
        }
    }
}

impl Backend for HttpBackend {
    fn fetch_task(&self, test_link: &str, session_id: &str) -> Result<TaskResponse, BackendError> {
        let resp = self.post(
            &format!("/candidate/{test_link}/task"),
            serde_json::json!({ "sessionId": session_id }),
        )?;
        Ok(resp.into_json::<TaskResponse>()?)
    }

    fn submit_answer(
        &self,
        skill_session_id: &str,
        body: &SubmissionBody,
    ) -> Result<(), BackendError> {
        self.post(
            &format!("/candidate/skill-session/{skill_session_id}/submit"),
            body,
        )?;
        Ok(())
    }

    fn send_event(
        &self,
        test_link: &str,
        event_type: &str,
        payload: Value,
    ) -> Result<(), BackendError> {
        self.post(
            &format!("/candidate/{test_link}/event"),
            serde_json::json!({ "type": event_type, "payload": payload }),
        )?;
        Ok(())
    }
}

/// What the mock observed, shared with the test through an `Rc` handle.
#[derive(Debug, Default)]
pub struct MockCalls {
    pub task_fetches: Vec<(String, String)>,
    pub submissions: Vec<(String, SubmissionBody)>,
    pub events: Vec<(String, String, Value)>,
}

/// In-process backend double. Scripted responses, recorded calls.
pub struct MockBackend {
    task_result: Result<TaskResponse, String>,
    fail_submission: bool,
    fail_events: bool,
    calls: Rc<RefCell<MockCalls>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            task_result: Ok(TaskResponse {
                task: TaskFields {
                    task_name: "Sample task".to_string(),
                    task_description: "Describe your approach.".to_string(),
                },
                skill_session_id: "skill-session-1".to_string(),
            }),
            fail_submission: false,
            fail_events: false,
            calls: Rc::new(RefCell::new(MockCalls::default())),
        }
    }

    pub fn with_task(mut self, name: &str, description: &str, skill_session_id: &str) -> Self {
        self.task_result = Ok(TaskResponse {
            task: TaskFields {
                task_name: name.to_string(),
                task_description: description.to_string(),
            },
            skill_session_id: skill_session_id.to_string(),
        });
        self
    }

    pub fn with_task_error(mut self, message: &str) -> Self {
        self.task_result = Err(message.to_string());
        self
    }

    /// Make `submit_answer` fail with a transport error.
    pub fn failing_submission(mut self) -> Self {
        self.fail_submission = true;
        self
    }

    /// Make telemetry fail with a transport error.
    pub fn failing_events(mut self) -> Self {
        self.fail_events = true;
        self
    }

    /// Handle for inspecting recorded calls after the backend has been
    /// moved into a controller.
    pub fn calls(&self) -> Rc<RefCell<MockCalls>> {
        Rc::clone(&self.calls)
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for MockBackend {
    fn fetch_task(&self, test_link: &str, session_id: &str) -> Result<TaskResponse, BackendError> {
        self.calls
            .borrow_mut()
            .task_fetches
            .push((test_link.to_string(), session_id.to_string()));
        match &self.task_result {
            Ok(resp) => Ok(resp.clone()),
            Err(message) => Err(BackendError::Status {
                code: 400,
                message: message.clone(),
            }),
        }
    }

    fn submit_answer(
        &self,
        skill_session_id: &str,
        body: &SubmissionBody,
    ) -> Result<(), BackendError> {
        self.calls
            .borrow_mut()
            .submissions
            .push((skill_session_id.to_string(), body.clone()));
        if self.fail_submission {
            return Err(BackendError::Transport("connection refused".to_string()));
        }
        Ok(())
    }

    fn send_event(
        &self,
        test_link: &str,
        event_type: &str,
        payload: Value,
    ) -> Result<(), BackendError> {
        self.calls.borrow_mut().events.push((
            test_link.to_string(),
            event_type.to_string(),
            payload,
        ));
        if self.fail_events {
            return Err(BackendError::Transport("connection refused".to_string()));
        }
        Ok(())
    }
}
