//! Quiz activity resolver.
//!
//! Quizzes are graded on submission: a recorded grade implies the attempt
//! is complete, even when the completion flag lagged behind.

use std::sync::Arc;

use async_trait::async_trait;

use proficio_core::model::{ActivityInfo, CompletionState, GradeSnapshot, UserId};
use proficio_core::traits::{ActivityResolver, SignalSource};

pub struct QuizResolver {
    signals: Arc<dyn SignalSource>,
}

impl QuizResolver {
    pub fn new(signals: Arc<dyn SignalSource>) -> Self {
        Self { signals }
    }
}

#[async_trait]
impl ActivityResolver for QuizResolver {
    fn type_tag(&self) -> &str {
        "quiz"
    }

    fn display_name(&self, activity: &ActivityInfo) -> String {
        format!("Quiz: {}", activity.name)
    }

    async fn completion_state(
        &self,
        activity: &ActivityInfo,
        user: UserId,
    ) -> anyhow::Result<CompletionState> {
        let signal = self.signals.signal(activity.id, user)?;
        Ok(match signal {
            Some(s) if s.grade.is_some() => CompletionState::Complete,
            Some(s) => s.completion,
            None => CompletionState::NotStarted,
        })
    }

    async fn grade(
        &self,
        activity: &ActivityInfo,
        user: UserId,
    ) -> anyhow::Result<Option<GradeSnapshot>> {
        Ok(self.signals.signal(activity.id, user)?.and_then(|s| s.grade))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MapSignals;
    use proficio_core::model::ActivitySignal;

    fn quiz_activity() -> ActivityInfo {
        ActivityInfo {
            id: 100,
            type_tag: "quiz".into(),
            name: "Fractions".into(),
            course: 2,
            ordering: 1,
        }
    }

    #[tokio::test]
    async fn graded_quiz_counts_as_complete_even_if_flag_lags() {
        let signals = Arc::new(MapSignals::single(
            100,
            5,
            ActivitySignal {
                completion: CompletionState::InProgress,
                grade: Some(GradeSnapshot {
                    value: 7.5,
                    max: 10.0,
                }),
            },
        ));
        let resolver = QuizResolver::new(signals);
        let state = resolver.completion_state(&quiz_activity(), 5).await.unwrap();
        assert_eq!(state, CompletionState::Complete);
        let grade = resolver.grade(&quiz_activity(), 5).await.unwrap().unwrap();
        assert_eq!(grade.value, 7.5);
    }

    #[tokio::test]
    async fn no_signal_means_not_started() {
        let resolver = QuizResolver::new(Arc::new(MapSignals::empty()));
        let state = resolver.completion_state(&quiz_activity(), 5).await.unwrap();
        assert_eq!(state, CompletionState::NotStarted);
    }

    #[test]
    fn display_name_prefixes_type() {
        let resolver = QuizResolver::new(Arc::new(MapSignals::empty()));
        assert_eq!(resolver.display_name(&quiz_activity()), "Quiz: Fractions");
    }
}
