//! Activity link index: resolves the evidence-source activities linked to
//! a competency within a course, independent of activity type.

use std::sync::Arc;

use crate::model::{ActivityInfo, ActivityRef, CompetencyId, CourseId};
use crate::registry::ActivityRegistry;
use crate::traits::CompetencyCatalog;

/// Resolves linked activities to display-ready references via the type
/// registry.
pub struct ActivityIndex {
    catalog: Arc<dyn CompetencyCatalog>,
    registry: Arc<ActivityRegistry>,
}

impl ActivityIndex {
    pub fn new(catalog: Arc<dyn CompetencyCatalog>, registry: Arc<ActivityRegistry>) -> Self {
        Self { catalog, registry }
    }

    pub fn registry(&self) -> &ActivityRegistry {
        &self.registry
    }

    /// Activities serving as evidence sources for (competency, course).
    ///
    /// Unknown competency or course yields an empty list, never an error;
    /// reports must degrade gracefully.
    pub fn linked_activities(&self, competency: CompetencyId, course: CourseId) -> Vec<ActivityRef> {
        self.linked_with_info(competency, course)
            .into_iter()
            .map(|(reference, _)| reference)
            .collect()
    }

    /// Like [`linked_activities`](Self::linked_activities), but keeps the
    /// raw catalog rows alongside so the evidence aggregator can feed them
    /// back to the resolvers for signal lookup.
    pub fn linked_with_info(
        &self,
        competency: CompetencyId,
        course: CourseId,
    ) -> Vec<(ActivityRef, ActivityInfo)> {
        let mut activities = self.catalog.linked_activities(competency, course);
        activities.sort_by_key(|a| (a.ordering, a.id));

        activities
            .into_iter()
            .map(|info| {
                let resolver = self.registry.resolver_for(&info.type_tag);
                let reference = ActivityRef {
                    id: info.id,
                    type_tag: info.type_tag.clone(),
                    display_name: resolver.display_name(&info),
                    ordering_hint: info.ordering,
                };
                (reference, info)
            })
            .collect()
    }
}
