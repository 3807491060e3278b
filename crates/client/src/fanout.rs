//! Which upstream events invalidate which read caches.
//!
//! | trigger                     | invalidated caches                                   |
//! |-----------------------------|------------------------------------------------------|
//! | job completed for project P | `ProjectList`, `MeetingList`, `ProjectSummaries(P)`, `ProjectBlockers(P)` |
//!
//! The set is fixed; nothing registers extra targets at runtime.

use tellmemo_core::ProjectId;

use crate::cache::{CacheKey, CacheRegistry};

/// Caches made stale by a job completing for `project_id`.
pub fn job_completion_targets(project_id: &ProjectId) -> [CacheKey; 4] {
    [
        CacheKey::ProjectList,
        CacheKey::MeetingList,
        CacheKey::ProjectSummaries(project_id.clone()),
        CacheKey::ProjectBlockers(project_id.clone()),
    ]
}

/// Invalidate the completion fan-out for a project.
pub fn invalidate_for_job_completion(registry: &CacheRegistry, project_id: &ProjectId) {
    for key in job_completion_targets(project_id) {
        registry.invalidate(&key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_fanout_covers_the_four_caches() {
        let registry = CacheRegistry::new();
        let project = ProjectId::from("p1");
        invalidate_for_job_completion(&registry, &project);

        for key in job_completion_targets(&project) {
            assert_eq!(registry.invalidation_count(&key), 1, "{key}");
        }
        // Other projects are left alone.
        let other = CacheKey::ProjectSummaries(ProjectId::from("p2"));
        assert_eq!(registry.invalidation_count(&other), 0);
    }
}
