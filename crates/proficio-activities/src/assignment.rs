//! Assignment activity resolver.
//!
//! Assignments expose the declared completion state as-is, and only
//! surface a grade once the submission is complete; draft grades on
//! unsubmitted work stay hidden.

use std::sync::Arc;

use async_trait::async_trait;

use proficio_core::model::{ActivityInfo, CompletionState, GradeSnapshot, UserId};
use proficio_core::traits::{ActivityResolver, SignalSource};

pub struct AssignmentResolver {
    signals: Arc<dyn SignalSource>,
}

impl AssignmentResolver {
    pub fn new(signals: Arc<dyn SignalSource>) -> Self {
        Self { signals }
    }
}

#[async_trait]
impl ActivityResolver for AssignmentResolver {
    fn type_tag(&self) -> &str {
        "assignment"
    }

    fn display_name(&self, activity: &ActivityInfo) -> String {
        format!("Assignment: {}", activity.name)
    }

    async fn completion_state(
        &self,
        activity: &ActivityInfo,
        user: UserId,
    ) -> anyhow::Result<CompletionState> {
        Ok(self
            .signals
            .signal(activity.id, user)?
            .map(|s| s.completion)
            .unwrap_or(CompletionState::NotStarted))
    }

    async fn grade(
        &self,
        activity: &ActivityInfo,
        user: UserId,
    ) -> anyhow::Result<Option<GradeSnapshot>> {
        Ok(self
            .signals
            .signal(activity.id, user)?
            .filter(|s| s.completion == CompletionState::Complete)
            .and_then(|s| s.grade))
    }
}
