//! Framework store: builds the per-course competency forest.
//!
//! Only frameworks with at least one competency actually linked to the
//! course are included. Nodes are held in a flat arena with a
//! parent-to-children index built once per request; traversal uses an
//! explicit stack so malformed or very deep trees cannot blow the call
//! stack.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::model::{Competency, CompetencyId, CourseId, Framework, ROOT_PARENT_KEY};
use crate::traits::CompetencyCatalog;

/// One framework's slice of a course forest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameworkBundle {
    pub framework: Framework,
    /// Arena of linked competencies, keyed by id.
    pub nodes: HashMap<CompetencyId, Competency>,
    /// Parent-to-children index. Roots live under [`ROOT_PARENT_KEY`];
    /// children within a bucket are ordered by competency id.
    pub children: HashMap<CompetencyId, Vec<CompetencyId>>,
}

impl FrameworkBundle {
    /// Root competencies of this bundle, in id order.
    pub fn roots(&self) -> &[CompetencyId] {
        self.children
            .get(&ROOT_PARENT_KEY)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Depth-first walk over the forest, yielding `(depth, node)` rows in
    /// display order. Iterative with a visited guard, so a malformed cycle
    /// terminates instead of recursing forever.
    pub fn walk(&self) -> Vec<(usize, &Competency)> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut visited = HashSet::new();
        let mut stack: Vec<(usize, CompetencyId)> =
            self.roots().iter().rev().map(|&id| (0, id)).collect();

        while let Some((depth, id)) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            let Some(node) = self.nodes.get(&id) else {
                continue;
            };
            out.push((depth, node));
            if let Some(kids) = self.children.get(&id) {
                for &kid in kids.iter().rev() {
                    stack.push((depth + 1, kid));
                }
            }
        }

        out
    }
}

/// Build the competency forest for a course.
///
/// Fails with `NotFound` when the course does not exist; a course with no
/// linked frameworks yields an empty list, not an error.
pub fn build_course_forest(
    catalog: &dyn CompetencyCatalog,
    course: CourseId,
) -> Result<Vec<FrameworkBundle>, EngineError> {
    if !catalog.course_exists(course) {
        return Err(EngineError::course_not_found(course));
    }

    // Group linked competencies by framework, dropping dangling link rows.
    let mut by_framework: HashMap<u64, Vec<Competency>> = HashMap::new();
    for id in catalog.linked_competencies(course) {
        match catalog.competency(id) {
            Some(competency) => by_framework
                .entry(competency.framework)
                .or_default()
                .push(competency),
            None => {
                tracing::warn!("course {course} links unknown competency {id}, skipping");
            }
        }
    }

    let mut bundles = Vec::with_capacity(by_framework.len());
    for (framework_id, competencies) in by_framework {
        let Some(framework) = catalog.framework(framework_id) else {
            tracing::warn!("framework {framework_id} missing from catalog, skipping");
            continue;
        };

        let nodes: HashMap<CompetencyId, Competency> =
            competencies.into_iter().map(|c| (c.id, c)).collect();

        let mut children: HashMap<CompetencyId, Vec<CompetencyId>> = HashMap::new();
        for node in nodes.values() {
            // Normalized at ingestion, but re-collapse here so a record
            // that slipped past with parent = Some(0) still roots once.
            let parent = Competency::normalize_parent(node.parent);
            let bucket = match parent {
                // A parent outside the linked set buckets as a root: the
                // course view must still show the node somewhere.
                Some(p) if nodes.contains_key(&p) => p,
                Some(_) | None => ROOT_PARENT_KEY,
            };
            children.entry(bucket).or_default().push(node.id);
        }
        for bucket in children.values_mut() {
            bucket.sort_unstable();
        }

        rebucket_unreachable(&nodes, &mut children);

        bundles.push(FrameworkBundle {
            framework,
            nodes,
            children,
        });
    }

    bundles.sort_by_key(|b| b.framework.id);
    Ok(bundles)
}

/// Move members of parent cycles into the root bucket so every linked node
/// is reachable from the roots exactly once.
fn rebucket_unreachable(
    nodes: &HashMap<CompetencyId, Competency>,
    children: &mut HashMap<CompetencyId, Vec<CompetencyId>>,
) {
    loop {
        let mut reachable = HashSet::new();
        let mut stack: Vec<CompetencyId> = children
            .get(&ROOT_PARENT_KEY)
            .map(|roots| roots.clone())
            .unwrap_or_default();
        while let Some(id) = stack.pop() {
            if !reachable.insert(id) {
                continue;
            }
            if let Some(kids) = children.get(&id) {
                stack.extend(kids.iter().copied());
            }
        }

        let Some(&orphan) = nodes
            .keys()
            .filter(|id| !reachable.contains(*id))
            .min()
        else {
            return;
        };

        tracing::warn!("competency {orphan} is in a parent cycle, treating as root");
        for bucket in children.values_mut() {
            bucket.retain(|&id| id != orphan);
        }
        let roots = children.entry(ROOT_PARENT_KEY).or_default();
        roots.push(orphan);
        roots.sort_unstable();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ActivityInfo, Course, Framework, Scale, User};
    use crate::traits::CompetencyCatalog;

    struct FixtureCatalog {
        frameworks: Vec<Framework>,
        competencies: Vec<Competency>,
        links: Vec<(CourseId, CompetencyId)>,
        courses: Vec<CourseId>,
    }

    impl FixtureCatalog {
        fn competency(id: CompetencyId, parent: Option<CompetencyId>, framework: u64) -> Competency {
            Competency {
                id,
                shortname: format!("c{id}"),
                idnumber: String::new(),
                description: String::new(),
                parent: Competency::normalize_parent(parent),
                framework,
            }
        }

        fn framework(id: u64) -> Framework {
            Framework {
                id,
                shortname: format!("f{id}"),
                idnumber: String::new(),
                scale: Scale(vec!["Not Yet".into(), "Getting There".into(), "Got It".into()]),
                proficiency_threshold: 3,
            }
        }
    }

    impl CompetencyCatalog for FixtureCatalog {
        fn course(&self, id: CourseId) -> Option<Course> {
            self.courses.contains(&id).then(|| Course {
                id,
                shortname: format!("course-{id}"),
            })
        }

        fn user(&self, _id: u64) -> Option<User> {
            None
        }

        fn framework(&self, id: u64) -> Option<Framework> {
            self.frameworks.iter().find(|f| f.id == id).cloned()
        }

        fn competency(&self, id: CompetencyId) -> Option<Competency> {
            self.competencies.iter().find(|c| c.id == id).cloned()
        }

        fn linked_competencies(&self, course: CourseId) -> Vec<CompetencyId> {
            self.links
                .iter()
                .filter(|(c, _)| *c == course)
                .map(|(_, comp)| *comp)
                .collect()
        }

        fn linked_activities(&self, _c: CompetencyId, _course: CourseId) -> Vec<ActivityInfo> {
            vec![]
        }
    }

    fn two_framework_fixture() -> FixtureCatalog {
        FixtureCatalog {
            frameworks: vec![FixtureCatalog::framework(1), FixtureCatalog::framework(2)],
            competencies: vec![
                // Framework 1: root 10 (parent absent), root 11 (parent 0), child 12 of 10.
                FixtureCatalog::competency(10, None, 1),
                FixtureCatalog::competency(11, Some(0), 1),
                FixtureCatalog::competency(12, Some(10), 1),
                // Framework 2: never linked anywhere.
                FixtureCatalog::competency(20, None, 2),
            ],
            links: vec![(2, 10), (2, 11), (2, 12)],
            courses: vec![2],
        }
    }

    #[test]
    fn unlinked_framework_is_excluded() {
        let catalog = two_framework_fixture();
        let forest = build_course_forest(&catalog, 2).unwrap();
        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].framework.id, 1);
    }

    #[test]
    fn missing_course_is_not_found() {
        let catalog = two_framework_fixture();
        let err = build_course_forest(&catalog, 99).unwrap_err();
        assert_eq!(err.to_string(), "course 99 not found");
    }

    #[test]
    fn no_links_yields_empty_forest() {
        let mut catalog = two_framework_fixture();
        catalog.links.clear();
        let forest = build_course_forest(&catalog, 2).unwrap();
        assert!(forest.is_empty());
    }

    #[test]
    fn null_and_zero_parents_each_root_exactly_once() {
        let catalog = two_framework_fixture();
        let forest = build_course_forest(&catalog, 2).unwrap();
        let bundle = &forest[0];
        assert_eq!(bundle.roots(), &[10, 11]);
        assert_eq!(bundle.children.get(&10).unwrap(), &vec![12]);
        // Every linked node appears exactly once in the walk.
        let walked: Vec<_> = bundle.walk().iter().map(|(_, c)| c.id).collect();
        assert_eq!(walked, vec![10, 12, 11]);
    }

    #[test]
    fn parent_outside_linked_set_becomes_root() {
        let mut catalog = two_framework_fixture();
        // 12's parent (10) is no longer linked to the course.
        catalog.links = vec![(2, 11), (2, 12)];
        let forest = build_course_forest(&catalog, 2).unwrap();
        assert_eq!(forest[0].roots(), &[11, 12]);
    }

    #[test]
    fn parent_cycle_terminates_and_keeps_all_nodes() {
        let catalog = FixtureCatalog {
            frameworks: vec![FixtureCatalog::framework(1)],
            competencies: vec![
                FixtureCatalog::competency(30, Some(31), 1),
                FixtureCatalog::competency(31, Some(30), 1),
                FixtureCatalog::competency(32, None, 1),
            ],
            links: vec![(2, 30), (2, 31), (2, 32)],
            courses: vec![2],
        };
        let forest = build_course_forest(&catalog, 2).unwrap();
        let walked: Vec<_> = forest[0].walk().iter().map(|(_, c)| c.id).collect();
        let mut sorted = walked.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, vec![30, 31, 32]);
        assert_eq!(walked.len(), 3);
    }

    #[test]
    fn deep_chain_walks_without_recursion() {
        let mut competencies = vec![FixtureCatalog::competency(1, None, 1)];
        let mut links = vec![(2, 1)];
        for id in 2..=5_000u64 {
            competencies.push(FixtureCatalog::competency(id, Some(id - 1), 1));
            links.push((2, id));
        }
        let catalog = FixtureCatalog {
            frameworks: vec![FixtureCatalog::framework(1)],
            competencies,
            links,
            courses: vec![2],
        };
        let forest = build_course_forest(&catalog, 2).unwrap();
        let rows = forest[0].walk();
        assert_eq!(rows.len(), 5_000);
        assert_eq!(rows.last().unwrap().0, 4_999);
    }
}
