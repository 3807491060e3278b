use tellmemo_core::SummaryRecord;

use crate::error::ExportError;

pub fn render(summary: &SummaryRecord) -> Result<Vec<u8>, ExportError> {
    let mut bytes = serde_json::to_vec_pretty(summary)?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Read a summary back from a JSON export.
pub fn summary_from_json(bytes: &[u8]) -> Result<SummaryRecord, ExportError> {
    Ok(serde_json::from_slice(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tellmemo_core::{Blocker, LessonLearned, ProjectId, SummaryType};

    #[test]
    fn reread_reproduces_the_summary() {
        let mut summary = SummaryRecord::new("Portfolio review", "Three programs on track.");
        summary.summary_type = SummaryType::Portfolio;
        summary.project_id = Some(ProjectId::from("p1"));
        summary.agenda = vec!["Budget".into(), "Hiring".into()];
        let mut blocker = Blocker::new("Waiting on legal");
        blocker.owner = Some("Sam".into());
        summary.blockers.push(blocker);
        summary.lessons_learned.push(LessonLearned::new("Start audits earlier"));

        let bytes = render(&summary).unwrap();
        let back = summary_from_json(&bytes).unwrap();
        assert_eq!(back, summary);
        assert!(!String::from_utf8(bytes).unwrap().contains("action_items"));
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(summary_from_json(b"not json"), Err(ExportError::Json(_))));
    }
}
