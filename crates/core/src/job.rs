//! Job snapshots as tracked by the client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::DomainError;
use crate::id::{ContentId, JobId, ProjectId, SummaryId};

/// Job execution status as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Accepted, waiting for a worker
    #[serde(alias = "queued")]
    Pending,
    /// A worker is on it
    #[serde(alias = "running")]
    Processing,
    /// Results are durably persisted
    Completed,
    /// Gave up; the backend owns any retry
    Failed,
}

impl JobStatus {
    /// `completed` and `failed` are terminal: no further transitions are expected.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Still running from the user's point of view.
    pub fn is_active(&self) -> bool {
        matches!(self, JobStatus::Pending | JobStatus::Processing)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

impl core::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for JobStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" | "queued" => Ok(JobStatus::Pending),
            "processing" | "running" => Ok(JobStatus::Processing),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            other => Err(DomainError::validation(format!("unknown job status: {other}"))),
        }
    }
}

/// Typed view over the free-form result payload of a finished job.
///
/// The well-known keys are lifted into fields; everything else stays in
/// `extra` untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_id: Option<ContentId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary_id: Option<SummaryId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<ProjectId>,
    /// Set when processing created a brand new project for the content.
    #[serde(
        default,
        alias = "new_project",
        alias = "is_new_project",
        deserialize_with = "null_as_false"
    )]
    pub new_project_created: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn null_as_false<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

impl JobResult {
    /// Decode a raw payload. Anything but a JSON object is rejected.
    pub fn from_value(value: Value) -> Result<Self, DomainError> {
        if !value.is_object() {
            return Err(DomainError::validation("job result must be a JSON object"));
        }
        let mut result: JobResult = serde_json::from_value(value)
            .map_err(|e| DomainError::validation(format!("job result: {e}")))?;

        // Blank ids are treated as absent.
        if result.content_id.as_ref().is_some_and(|id| id.as_str().trim().is_empty()) {
            result.content_id = None;
        }
        if result.summary_id.as_ref().is_some_and(|id| id.as_str().trim().is_empty()) {
            result.summary_id = None;
        }
        if result.project_id.as_ref().is_some_and(|id| id.as_str().trim().is_empty()) {
            result.project_id = None;
        }
        Ok(result)
    }

    pub fn with_summary(mut self, summary_id: impl Into<SummaryId>) -> Self {
        self.summary_id = Some(summary_id.into());
        self
    }

    pub fn with_content(mut self, content_id: impl Into<ContentId>) -> Self {
        self.content_id = Some(content_id.into());
        self
    }

    pub fn with_new_project(mut self, project_id: impl Into<ProjectId>) -> Self {
        self.project_id = Some(project_id.into());
        self.new_project_created = true;
        self
    }
}

impl From<SummaryId> for JobResult {
    fn from(summary_id: SummaryId) -> Self {
        JobResult::default().with_summary(summary_id)
    }
}

/// A job tracked by the client, from submission until eviction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub project_id: ProjectId,
    pub content_id: Option<ContentId>,
    pub status: JobStatus,
    /// Fraction done, 0.0..=1.0.
    pub progress: f64,
    pub result: Option<JobResult>,
    pub current_step: Option<String>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// A freshly submitted job in `pending` state.
    pub fn new(id: JobId, project_id: ProjectId, content_id: Option<ContentId>) -> Self {
        let now = Utc::now();
        Self {
            id,
            project_id,
            content_id,
            status: JobStatus::Pending,
            progress: 0.0,
            result: None,
            current_step: None,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_accepts_backend_aliases() {
        let s: JobStatus = serde_json::from_value(json!("queued")).unwrap();
        assert_eq!(s, JobStatus::Pending);
        let s: JobStatus = "running".parse().unwrap();
        assert_eq!(s, JobStatus::Processing);
        assert!("exploded".parse::<JobStatus>().is_err());
    }

    #[test]
    fn terminal_states() {
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(!JobStatus::Processing.is_terminal());
        assert!(JobStatus::Pending.is_active());
    }

    #[test]
    fn result_lifts_known_keys_and_keeps_the_rest() {
        let result = JobResult::from_value(json!({
            "summary_id": "s1",
            "content_id": "",
            "new_project": true,
            "project_id": "p9",
            "word_count": 1200
        }))
        .unwrap();

        assert_eq!(result.summary_id, Some(SummaryId::from("s1")));
        assert_eq!(result.content_id, None);
        assert_eq!(result.project_id, Some(ProjectId::from("p9")));
        assert!(result.new_project_created);
        assert_eq!(result.extra.get("word_count"), Some(&json!(1200)));
    }

    #[test]
    fn null_new_project_flag_reads_as_false() {
        let result =
            JobResult::from_value(json!({ "summary_id": "s1", "new_project_created": null })).unwrap();
        assert!(!result.new_project_created);
        assert_eq!(result.summary_id, Some(SummaryId::from("s1")));
        assert!(result.extra.is_empty());
    }

    #[test]
    fn result_must_be_an_object() {
        assert!(JobResult::from_value(json!(["s1"])).is_err());
    }

    #[test]
    fn new_job_is_pending_with_zero_progress() {
        let job = Job::new(JobId::from("j1"), ProjectId::from("p1"), None);
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.progress, 0.0);
        assert!(job.result.is_none());
    }
}
