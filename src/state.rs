use std::sync::Arc;

use crate::workflow::SubmissionWorkflow;

#[derive(Clone)]
pub struct AppState {
    pub workflow: Arc<SubmissionWorkflow>,
}
