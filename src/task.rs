use crate::backend::{Backend, BackendError};

/// The personalized assessment task shown to the candidate. Immutable once
/// loaded; the attempt session id scopes this single attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Task {
    pub name: String,
    pub description: String,
    pub attempt_session_id: String,
}

/// One-shot task fetch at session start. There is no automatic retry: a
/// failure is terminal for the session and the candidate must reopen it.
pub struct TaskLoader;

impl TaskLoader {
    pub fn load<B: Backend>(
        backend: &B,
        test_link: &str,
        prior_session_id: &str,
    ) -> Result<Task, BackendError> {
        let resp = backend.fetch_task(test_link, prior_session_id)?;
        Ok(Task {
            name: resp.task.task_name,
            description: resp.task.task_description,
            attempt_session_id: resp.skill_session_id,
        })
    }
}
