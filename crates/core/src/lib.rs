//! `tellmemo-core`: shared client model.
//!
//! Identifiers, job snapshots, summary records and the notification seam.
//! No IO and no async here; transports and services live in the other crates.

pub mod error;
pub mod id;
pub mod job;
pub mod notify;
pub mod summary;

pub use error::{DomainError, DomainResult};
pub use id::{ContentId, JobId, ProjectId, SummaryId};
pub use job::{Job, JobResult, JobStatus};
pub use notify::{Notice, NoticeLevel, Notifier, RecordingNotifier, TracingNotifier};
pub use summary::{
    ActionItem, Blocker, Decision, LessonLearned, OpenQuestion, Risk, SummaryRecord, SummaryType,
};
