//! Mock resolvers and signal sources for testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use proficio_core::model::{
    ActivityInfo, ActivityInstanceId, ActivitySignal, CompletionState, GradeSnapshot, UserId,
};
use proficio_core::traits::{ActivityResolver, SignalSource};

/// A fixed in-memory signal table.
pub struct MapSignals {
    rows: HashMap<(ActivityInstanceId, UserId), ActivitySignal>,
}

impl MapSignals {
    pub fn empty() -> Self {
        Self {
            rows: HashMap::new(),
        }
    }

    pub fn single(activity: ActivityInstanceId, user: UserId, signal: ActivitySignal) -> Self {
        let mut rows = HashMap::new();
        rows.insert((activity, user), signal);
        Self { rows }
    }

    pub fn from_rows(
        rows: impl IntoIterator<Item = (ActivityInstanceId, UserId, ActivitySignal)>,
    ) -> Self {
        Self {
            rows: rows
                .into_iter()
                .map(|(a, u, s)| ((a, u), s))
                .collect(),
        }
    }
}

impl SignalSource for MapSignals {
    fn signal(
        &self,
        instance: ActivityInstanceId,
        user: UserId,
    ) -> anyhow::Result<Option<ActivitySignal>> {
        Ok(self.rows.get(&(instance, user)).copied())
    }
}

/// A signal source that always fails, for exercising partial-failure paths.
pub struct FailingSignals {
    message: String,
}

impl FailingSignals {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

impl SignalSource for FailingSignals {
    fn signal(
        &self,
        _instance: ActivityInstanceId,
        _user: UserId,
    ) -> anyhow::Result<Option<ActivitySignal>> {
        anyhow::bail!("{}", self.message)
    }
}

/// A mock activity resolver with a scripted outcome and call counting.
pub struct MockResolver {
    tag: String,
    completion: CompletionState,
    grade: Option<GradeSnapshot>,
    failure: Option<String>,
    calls: AtomicU32,
}

impl MockResolver {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            completion: CompletionState::NotStarted,
            grade: None,
            failure: None,
            calls: AtomicU32::new(0),
        }
    }

    pub fn with_completion(mut self, completion: CompletionState) -> Self {
        self.completion = completion;
        self
    }

    pub fn with_grade(mut self, value: f64, max: f64) -> Self {
        self.grade = Some(GradeSnapshot { value, max });
        self
    }

    /// A resolver whose signal lookups always fail.
    pub fn failing(tag: &str, message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::new(tag)
        }
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::Relaxed)
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    fn outcome<T>(&self, value: T) -> anyhow::Result<T> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        match &self.failure {
            Some(message) => anyhow::bail!("{message}"),
            None => Ok(value),
        }
    }
}

#[async_trait]
impl ActivityResolver for MockResolver {
    fn type_tag(&self) -> &str {
        &self.tag
    }

    fn display_name(&self, activity: &ActivityInfo) -> String {
        format!("{}: {}", self.tag, activity.name)
    }

    async fn completion_state(
        &self,
        _activity: &ActivityInfo,
        _user: UserId,
    ) -> anyhow::Result<CompletionState> {
        self.outcome(self.completion)
    }

    async fn grade(
        &self,
        _activity: &ActivityInfo,
        _user: UserId,
    ) -> anyhow::Result<Option<GradeSnapshot>> {
        self.outcome(self.grade)
    }
}
