// src/exam/report.rs

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    error::AppError,
    models::violation::{ViolationKind, ViolationRecord},
    store::ViolationSink,
};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentStat {
    pub student_id: String,
    /// Taken from the student's first record.
    pub student_name: String,
    pub count: usize,
    pub latest: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KindStat {
    pub kind: ViolationKind,
    pub count: usize,
    /// Share of all violations, 0 to 100.
    pub percentage: f64,
}

/// Violation summary for one paper, as shown to the instructor.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProctoringReport {
    pub title: String,
    pub total: usize,
    /// Most flagged first; ties keep first-seen order.
    pub students: Vec<StudentStat>,
    /// Kinds that occurred at least once.
    pub kinds: Vec<KindStat>,
    pub records: Vec<ViolationRecord>,
}

impl ProctoringReport {
    pub fn build(title: impl Into<String>, records: Vec<ViolationRecord>) -> Self {
        let mut students: Vec<StudentStat> = Vec::new();
        for record in &records {
            match students.iter_mut().find(|s| s.student_id == record.student_id) {
                Some(stat) => {
                    stat.count += 1;
                    stat.latest = stat.latest.max(record.timestamp);
                }
                None => students.push(StudentStat {
                    student_id: record.student_id.clone(),
                    student_name: record.student_name.clone(),
                    count: 1,
                    latest: record.timestamp,
                }),
            }
        }
        // sort_by is stable
        students.sort_by(|a, b| b.count.cmp(&a.count));

        let total = records.len();
        let kinds = ViolationKind::ALL
            .iter()
            .filter_map(|&kind| {
                let count = records.iter().filter(|r| r.violation_type == kind).count();
                (count > 0).then(|| KindStat {
                    kind,
                    count,
                    percentage: count as f64 * 100.0 / total as f64,
                })
            })
            .collect();

        Self {
            title: title.into(),
            total,
            students,
            kinds,
            records,
        }
    }

    /// Loads every violation logged against `paper_id`.
    pub async fn fetch(
        sink: &dyn ViolationSink,
        paper_id: &str,
        title: impl Into<String>,
    ) -> Result<Self, AppError> {
        let records = sink.violations_for_paper(paper_id).await?;
        tracing::debug!(paper_id, violations = records.len(), "Building proctoring report");
        Ok(Self::build(title, records))
    }

    pub fn flagged_students(&self) -> usize {
        self.students.len()
    }

    /// The downloadable plain-text report.
    pub fn render_text(&self, generated_at: DateTime<Utc>) -> String {
        let mut out = String::new();
        out.push_str(&format!("PROCTORING REPORT - {}\n", self.title));
        out.push_str(&format!("Generated on: {}\n", generated_at.format(TIMESTAMP_FORMAT)));
        out.push_str(&format!("Total Violations: {}\n", self.total));
        out.push_str(&format!("Students Flagged: {}\n", self.flagged_students()));
        out.push_str("==========================================\n\n");

        out.push_str("SUMMARY BY STUDENT:\n");
        for s in &self.students {
            out.push_str(&format!("- {}: {} violations\n", s.student_name, s.count));
        }

        out.push_str("\nDETAILED LOG:\n");
        for r in &self.records {
            let at = r
                .timestamp
                .map(|t| t.format(TIMESTAMP_FORMAT).to_string())
                .unwrap_or_else(|| "-".to_string());
            out.push_str(&format!(
                "[{}] {}: {} - {}\n",
                at, r.student_name, r.violation_type, r.details
            ));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn record(student: &str, name: &str, kind: ViolationKind, minute: u32) -> ViolationRecord {
        ViolationRecord {
            id: None,
            student_id: student.to_string(),
            student_name: name.to_string(),
            paper_id: "paper-1".to_string(),
            violation_type: kind,
            details: format!("{} detail", kind),
            timestamp: Some(Utc.with_ymd_and_hms(2025, 3, 14, 10, minute, 0).unwrap()),
        }
    }

    fn sample() -> ProctoringReport {
        ProctoringReport::build(
            "OOP Midterm",
            vec![
                record("stu-1", "Asha", ViolationKind::TabSwitch, 1),
                record("stu-2", "Ravi", ViolationKind::FocusLoss, 2),
                record("stu-2", "Ravi K", ViolationKind::TabSwitch, 5),
                record("stu-3", "Mei", ViolationKind::CopyPaste, 3),
            ],
        )
    }

    #[test]
    fn test_student_stats() {
        let report = sample();
        assert_eq!(report.total, 4);
        assert_eq!(report.flagged_students(), 3);

        let order: Vec<&str> = report.students.iter().map(|s| s.student_id.as_str()).collect();
        assert_eq!(order, vec!["stu-2", "stu-1", "stu-3"]);
        assert_eq!(report.students[0].student_name, "Ravi");
        assert_eq!(
            report.students[0].latest,
            Some(Utc.with_ymd_and_hms(2025, 3, 14, 10, 5, 0).unwrap())
        );
    }

    #[test]
    fn test_kind_stats_skip_zero_counts() {
        let report = sample();
        let kinds: Vec<(ViolationKind, usize)> = report.kinds.iter().map(|k| (k.kind, k.count)).collect();
        assert_eq!(
            kinds,
            vec![
                (ViolationKind::TabSwitch, 2),
                (ViolationKind::FocusLoss, 1),
                (ViolationKind::CopyPaste, 1),
            ]
        );
        assert_eq!(report.kinds[0].percentage, 50.0);
    }

    #[test]
    fn test_render_text() {
        let report = sample();
        let text = report.render_text(Utc.with_ymd_and_hms(2025, 3, 15, 9, 0, 0).unwrap());

        assert!(text.starts_with("PROCTORING REPORT - OOP Midterm\nGenerated on: 2025-03-15 09:00:00\n"));
        assert!(text.contains("Total Violations: 4\nStudents Flagged: 3\n"));
        assert!(text.contains("SUMMARY BY STUDENT:\n- Ravi: 2 violations\n- Asha: 1 violations\n"));
        assert!(text.contains("[2025-03-14 10:01:00] Asha: TAB_SWITCH - TAB_SWITCH detail\n"));
        assert!(text.ends_with("[2025-03-14 10:03:00] Mei: COPY_PASTE - COPY_PASTE detail\n"));
    }

    #[test]
    fn test_empty_report() {
        let report = ProctoringReport::build("Quiz", Vec::new());
        assert_eq!(report.total, 0);
        assert!(report.kinds.is_empty());
        assert!(report.render_text(Utc::now()).contains("Students Flagged: 0"));
    }
}
