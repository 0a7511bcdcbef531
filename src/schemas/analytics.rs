use serde::Serialize;

use crate::services::analytics::{
    DailyActivity, OverviewStats, QuizBreakdown, QuizPerformancePoint, QuizResultsStats,
    ScoreBucket, StudentOverview, StudentSummary,
};
use crate::schemas::attempt::AttemptResponse;

/// Everything the lecturer dashboard shows in one load: the stat cards, the
/// per-quiz performance breakdown and the student roster.
#[derive(Debug, Serialize)]
pub(crate) struct LecturerDashboardResponse {
    #[serde(flatten)]
    pub(crate) overview: OverviewStats,
    pub(crate) quiz_breakdown: Vec<QuizBreakdown>,
    pub(crate) students: Vec<StudentSummary>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChartsResponse {
    pub(crate) score_distribution: Vec<ScoreBucket>,
    pub(crate) quiz_performance: Vec<QuizPerformancePoint>,
    pub(crate) time_series: Vec<DailyActivity>,
    /// Class-wide pass rate at the 70% threshold (progress summary card).
    pub(crate) class_pass_rate: i32,
}

/// One row of the per-quiz results table.
#[derive(Debug, Serialize)]
pub(crate) struct QuizResultRow {
    pub(crate) attempt_id: String,
    pub(crate) student_name: String,
    pub(crate) student_email: String,
    pub(crate) score: i32,
    pub(crate) total_questions: i32,
    pub(crate) percentage: i32,
    pub(crate) time_taken_minutes: i32,
    pub(crate) date_taken: String,
    /// Pass badge threshold for this view is 70%.
    pub(crate) passed: bool,
    pub(crate) grade: &'static str,
}

#[derive(Debug, Serialize)]
pub(crate) struct QuizResultsResponse {
    pub(crate) quiz_id: String,
    pub(crate) title: String,
    pub(crate) stats: Option<QuizResultsStats>,
    pub(crate) results: Vec<QuizResultRow>,
}

#[derive(Debug, Serialize)]
pub(crate) struct StudentDashboardResponse {
    #[serde(flatten)]
    pub(crate) overview: StudentOverview,
    pub(crate) results: Vec<AttemptResponse>,
}
