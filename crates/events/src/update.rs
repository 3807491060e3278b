//! Job status update messages and their validated decoding.
//!
//! Every payload coming off the wire goes through [`JobUpdate::from_value`];
//! the rest of the client only ever sees the typed form.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use tellmemo_core::{Job, JobId, JobResult, JobStatus, ProjectId};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DecodeError {
    #[error("malformed payload: {0}")]
    Malformed(String),
    #[error("missing field: {0}")]
    MissingField(&'static str),
    #[error("unknown job status: {0}")]
    UnknownStatus(String),
    #[error("progress out of range: {0}")]
    ProgressOutOfRange(f64),
    #[error("invalid result payload: {0}")]
    InvalidResult(String),
}

/// Status snapshot for one job, as emitted by the job update channel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobUpdate {
    pub job_id: JobId,
    pub status: JobStatus,
    /// Fraction done, 0.0..=1.0.
    pub progress: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<JobResult>,
    /// Set when the backend moved the job to another (possibly new) project.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<ProjectId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_step: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// Loose wire shape; validated into [`JobUpdate`].
#[derive(Debug, Deserialize)]
struct RawJobUpdate {
    #[serde(default)]
    job_id: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    progress: Option<f64>,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    project_id: Option<String>,
    #[serde(default)]
    current_step: Option<String>,
    #[serde(default, alias = "error")]
    error_message: Option<String>,
}

impl JobUpdate {
    pub fn new(job_id: impl Into<JobId>, status: JobStatus) -> Self {
        let progress = if status == JobStatus::Completed { 1.0 } else { 0.0 };
        Self {
            job_id: job_id.into(),
            status,
            progress,
            result: None,
            project_id: None,
            current_step: None,
            error_message: None,
        }
    }

    pub fn with_progress(mut self, progress: f64) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_result(mut self, result: impl Into<JobResult>) -> Self {
        self.result = Some(result.into());
        self
    }

    pub fn with_project(mut self, project_id: impl Into<ProjectId>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    pub fn with_step(mut self, step: impl Into<String>) -> Self {
        self.current_step = Some(step.into());
        self
    }

    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    /// Decode a JSON text payload.
    pub fn from_json(text: &str) -> Result<Self, DecodeError> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| DecodeError::Malformed(e.to_string()))?;
        Self::from_value(value)
    }

    /// Validate a loosely-typed payload.
    ///
    /// A missing progress defaults to 1.0 for `completed` and 0.0 otherwise.
    pub fn from_value(value: Value) -> Result<Self, DecodeError> {
        let raw: RawJobUpdate =
            serde_json::from_value(value).map_err(|e| DecodeError::Malformed(e.to_string()))?;

        let job_id = raw
            .job_id
            .filter(|id| !id.trim().is_empty())
            .ok_or(DecodeError::MissingField("job_id"))?;
        let status_text = raw.status.ok_or(DecodeError::MissingField("status"))?;
        let status: JobStatus = status_text
            .parse()
            .map_err(|_| DecodeError::UnknownStatus(status_text.clone()))?;

        let progress = match raw.progress {
            Some(p) if !p.is_finite() || !(0.0..=1.0).contains(&p) => {
                return Err(DecodeError::ProgressOutOfRange(p));
            }
            Some(p) => p,
            None if status == JobStatus::Completed => 1.0,
            None => 0.0,
        };

        let result = match raw.result {
            None | Some(Value::Null) => None,
            Some(v) => Some(
                JobResult::from_value(v).map_err(|e| DecodeError::InvalidResult(e.to_string()))?,
            ),
        };

        Ok(Self {
            job_id: JobId::from(job_id.as_str()),
            status,
            progress,
            result,
            project_id: raw
                .project_id
                .filter(|id| !id.trim().is_empty())
                .map(|id| ProjectId::from(id.as_str())),
            current_step: raw.current_step,
            error_message: raw.error_message,
        })
    }

    /// Project the event points at, if any: the update-level id first, then
    /// the one inside the result payload.
    pub fn reported_project(&self) -> Option<&ProjectId> {
        self.project_id
            .as_ref()
            .or_else(|| self.result.as_ref().and_then(|r| r.project_id.as_ref()))
    }

    /// Replace the job's snapshot with this update.
    ///
    /// A missing result keeps the previous one; everything else is overwritten.
    pub fn apply_to(&self, job: &mut Job) {
        job.status = self.status;
        job.progress = self.progress;
        if let Some(result) = &self.result {
            job.result = Some(result.clone());
        }
        if let Some(project) = self.reported_project() {
            job.project_id = project.clone();
        }
        job.current_step = self.current_step.clone();
        job.error_message = self.error_message.clone();
        job.updated_at = Utc::now();
    }
}
