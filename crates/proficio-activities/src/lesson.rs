//! Lesson activity resolver.
//!
//! Lessons track progression only; they are never graded, so the grade
//! resolver always yields nothing regardless of stray signal rows.

use std::sync::Arc;

use async_trait::async_trait;

use proficio_core::model::{ActivityInfo, CompletionState, GradeSnapshot, UserId};
use proficio_core::traits::{ActivityResolver, SignalSource};

pub struct LessonResolver {
    signals: Arc<dyn SignalSource>,
}

impl LessonResolver {
    pub fn new(signals: Arc<dyn SignalSource>) -> Self {
        Self { signals }
    }
}

#[async_trait]
impl ActivityResolver for LessonResolver {
    fn type_tag(&self) -> &str {
        "lesson"
    }

    fn display_name(&self, activity: &ActivityInfo) -> String {
        format!("Lesson: {}", activity.name)
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
        _activity: &ActivityInfo,
        _user: UserId,
    ) -> anyhow::Result<Option<GradeSnapshot>> {
        Ok(None)
    }
}
