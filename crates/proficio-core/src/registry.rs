//! Activity type registry.
//!
//! Maps activity type tags to their resolvers. New activity types register
//! here instead of growing conditional chains at every call site;
//! unregistered tags get the generic fallback resolver.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::model::{ActivityInfo, CompletionState, GradeSnapshot, UserId};
use crate::traits::{ActivityResolver, SignalSource};

/// Registry mapping `type_tag` to the resolver handling that activity type.
pub struct ActivityRegistry {
    resolvers: HashMap<String, Arc<dyn ActivityResolver>>,
    fallback: Arc<dyn ActivityResolver>,
}

impl ActivityRegistry {
    /// Registry with the default generic fallback (no signal access).
    pub fn new() -> Self {
        Self::with_fallback(Arc::new(GenericResolver::detached()))
    }

    /// Registry with an explicit fallback resolver for unregistered tags.
    pub fn with_fallback(fallback: Arc<dyn ActivityResolver>) -> Self {
        Self {
            resolvers: HashMap::new(),
            fallback,
        }
    }

    /// Register a resolver under its own type tag, replacing any previous
    /// resolver for that tag.
    pub fn register(&mut self, resolver: Arc<dyn ActivityResolver>) {
        self.resolvers
            .insert(resolver.type_tag().to_string(), resolver);
    }

    /// Resolver for a type tag, falling back to the generic resolver for
    /// unregistered (e.g. future) activity types.
    pub fn resolver_for(&self, type_tag: &str) -> Arc<dyn ActivityResolver> {
        match self.resolvers.get(type_tag) {
            Some(resolver) => Arc::clone(resolver),
            None => {
                tracing::debug!("no resolver registered for '{type_tag}', using fallback");
                Arc::clone(&self.fallback)
            }
        }
    }

    pub fn registered_tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.resolvers.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }
}

impl Default for ActivityRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Fallback resolver for activity types nothing else claims.
///
/// Labels activities generically and, when wired to a signal source, passes
/// raw signals through untouched. Detached instances report every activity
/// as not started.
pub struct GenericResolver {
    signals: Option<Arc<dyn SignalSource>>,
}

impl GenericResolver {
    pub fn new(signals: Arc<dyn SignalSource>) -> Self {
        Self {
            signals: Some(signals),
        }
    }

    /// A fallback with no signal access at all.
    pub fn detached() -> Self {
        Self { signals: None }
    }

    fn lookup(
        &self,
        activity: &ActivityInfo,
        user: UserId,
    ) -> anyhow::Result<Option<crate::model::ActivitySignal>> {
        match &self.signals {
            Some(source) => source.signal(activity.id, user),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl ActivityResolver for GenericResolver {
    fn type_tag(&self) -> &str {
        "generic"
    }

    fn display_name(&self, activity: &ActivityInfo) -> String {
        format!("Activity {}", activity.id)
    }

    async fn completion_state(
        &self,
        activity: &ActivityInfo,
        user: UserId,
    ) -> anyhow::Result<CompletionState> {
        Ok(self
            .lookup(activity, user)?
            .map(|s| s.completion)
            .unwrap_or(CompletionState::NotStarted))
    }

    async fn grade(
        &self,
        activity: &ActivityInfo,
        user: UserId,
    ) -> anyhow::Result<Option<GradeSnapshot>> {
        Ok(self.lookup(activity, user)?.and_then(|s| s.grade))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unregistered_tag_falls_back_to_generic() {
        let registry = ActivityRegistry::new();
        let resolver = registry.resolver_for("holodeck");
        let activity = ActivityInfo {
            id: 31,
            type_tag: "holodeck".into(),
            name: "Simulation".into(),
            course: 1,
            ordering: 0,
        };
        assert_eq!(resolver.display_name(&activity), "Activity 31");
    }

    #[tokio::test]
    async fn detached_fallback_reports_not_started() {
        let resolver = GenericResolver::detached();
        let activity = ActivityInfo {
            id: 9,
            type_tag: "mystery".into(),
            name: "?".into(),
            course: 1,
            ordering: 0,
        };
        assert_eq!(
            resolver.completion_state(&activity, 5).await.unwrap(),
            CompletionState::NotStarted
        );
        assert!(resolver.grade(&activity, 5).await.unwrap().is_none());
    }
}
