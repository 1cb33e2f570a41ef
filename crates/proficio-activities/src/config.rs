//! Registry wiring for the built-in activity types.

use std::sync::Arc;

use proficio_core::registry::{ActivityRegistry, GenericResolver};
use proficio_core::traits::SignalSource;

use crate::assignment::AssignmentResolver;
use crate::lesson::LessonResolver;
use crate::quiz::QuizResolver;

/// Build the standard registry: quiz, assignment, and lesson resolvers
/// over the given signal source, with a signal-aware generic fallback for
/// anything else.
pub fn standard_registry(signals: Arc<dyn SignalSource>) -> ActivityRegistry {
    let mut registry =
        ActivityRegistry::with_fallback(Arc::new(GenericResolver::new(Arc::clone(&signals))));
    registry.register(Arc::new(QuizResolver::new(Arc::clone(&signals))));
    registry.register(Arc::new(AssignmentResolver::new(Arc::clone(&signals))));
    registry.register(Arc::new(LessonResolver::new(signals)));
    registry
}
