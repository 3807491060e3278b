//! AI-generated summary records, as handed to the exporters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::{ContentId, ProjectId, SummaryId};

/// Which level of the hierarchy a summary covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SummaryType {
    #[default]
    Meeting,
    Project,
    Program,
    Portfolio,
}

impl SummaryType {
    pub fn label(&self) -> &'static str {
        match self {
            SummaryType::Meeting => "Meeting Summary",
            SummaryType::Project => "Project Summary",
            SummaryType::Program => "Program Summary",
            SummaryType::Portfolio => "Portfolio Summary",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Risk {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mitigation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blocker {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionItem {
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urgency: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub importance: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonLearned {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenQuestion {
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raised_by: Option<String>,
}

/// A single summary with its optional sections.
///
/// Empty sections are skipped on serialization and default to empty on
/// deserialization, so a JSON export reads back to an equal record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRecord {
    pub id: SummaryId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<ProjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_id: Option<ContentId>,
    #[serde(default)]
    pub summary_type: SummaryType,
    pub subject: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub key_points: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub risks: Vec<Risk>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blockers: Vec<Blocker>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub action_items: Vec<ActionItem>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub decisions: Vec<Decision>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub agenda: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lessons_learned: Vec<LessonLearned>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub open_questions: Vec<OpenQuestion>,
}

impl SummaryRecord {
    /// A summary with only the mandatory parts filled in.
    pub fn new(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: SummaryId::generate(),
            project_id: None,
            content_id: None,
            summary_type: SummaryType::default(),
            subject: subject.into(),
            body: body.into(),
            created_at: Utc::now(),
            created_by: None,
            key_points: Vec::new(),
            risks: Vec::new(),
            blockers: Vec::new(),
            action_items: Vec::new(),
            decisions: Vec::new(),
            agenda: Vec::new(),
            lessons_learned: Vec::new(),
            open_questions: Vec::new(),
        }
    }
}

impl Risk {
    pub fn new(title: impl Into<String>) -> Self {
        Self { title: title.into(), description: None, severity: None, mitigation: None }
    }
}

impl Blocker {
    pub fn new(title: impl Into<String>) -> Self {
        Self { title: title.into(), description: None, impact: None, owner: None }
    }
}

impl ActionItem {
    pub fn new(description: impl Into<String>) -> Self {
        Self { description: description.into(), assignee: None, due_date: None, urgency: None }
    }
}

impl Decision {
    pub fn new(description: impl Into<String>) -> Self {
        Self { description: description.into(), importance: None, rationale: None }
    }
}

impl LessonLearned {
    pub fn new(title: impl Into<String>) -> Self {
        Self { title: title.into(), description: None, category: None }
    }
}

impl OpenQuestion {
    pub fn new(question: impl Into<String>) -> Self {
        Self { question: question.into(), raised_by: None }
    }
}
