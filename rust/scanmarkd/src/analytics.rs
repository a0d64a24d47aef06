use crate::store::answer_keys;
use crate::store::results::ExamResult;
use crate::store::StoreResult;
use rusqlite::Connection;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

pub const UNKNOWN_EXAM: &str = "Unknown Exam";
pub const NO_GRADE_LABEL: &str = "N/A";
pub const RECENT_WINDOW: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Improving,
    Declining,
    Stable,
}

/// Presentation values (`averageScore`, `passRate`, `recentAverage`) are
/// rounded to 2 decimals; the trend is decided on unrounded means.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceSummary {
    pub total_exams: usize,
    pub average_score: f64,
    pub highest_score: f64,
    pub lowest_score: f64,
    pub passed_exams: usize,
    pub failed_exams: usize,
    pub pass_rate: f64,
    pub grade_distribution: BTreeMap<String, usize>,
    pub recent_average: f64,
    pub trend: Trend,
}

pub fn round_2_decimals(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

fn graded_percentage(r: &ExamResult) -> Option<f64> {
    let p = r.percentage?;
    if p.is_finite() && (0.0..=100.0).contains(&p) {
        Some(p)
    } else {
        tracing::debug!(result_id = %r.id, percentage = p, "excluding result with invalid percentage");
        None
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Summarizes one student's history. `results` must already be ordered by
/// `examDate`, newest first; the recent window is taken from the front.
///
/// Returns `None` when no result carries a usable percentage. Results with a
/// percentage outside 0..=100 are skipped rather than failing the summary.
pub fn summarize(results: &[ExamResult]) -> Option<PerformanceSummary> {
    let graded: Vec<(&ExamResult, f64)> = results
        .iter()
        .filter_map(|r| graded_percentage(r).map(|p| (r, p)))
        .collect();
    if graded.is_empty() {
        return None;
    }

    let scores: Vec<f64> = graded.iter().map(|(_, p)| *p).collect();
    let total_exams = scores.len();
    let average = mean(&scores);
    let highest_score = scores.iter().cloned().fold(f64::MIN, f64::max);
    let lowest_score = scores.iter().cloned().fold(f64::MAX, f64::min);

    let passed_exams = graded.iter().filter(|(r, _)| r.passed).count();
    let failed_exams = total_exams - passed_exams;
    let pass_rate = passed_exams as f64 / total_exams as f64 * 100.0;

    let mut grade_distribution = BTreeMap::new();
    for (r, _) in &graded {
        let label = r
            .grade
            .as_deref()
            .map(str::trim)
            .filter(|g| !g.is_empty())
            .unwrap_or(NO_GRADE_LABEL);
        *grade_distribution.entry(label.to_string()).or_insert(0) += 1;
    }

    let recent_average = mean(&scores[..total_exams.min(RECENT_WINDOW)]);
    let trend = match recent_average.partial_cmp(&average) {
        Some(Ordering::Greater) => Trend::Improving,
        Some(Ordering::Less) => Trend::Declining,
        _ => Trend::Stable,
    };

    Some(PerformanceSummary {
        total_exams,
        average_score: round_2_decimals(average),
        highest_score,
        lowest_score,
        passed_exams,
        failed_exams,
        pass_rate: round_2_decimals(pass_rate),
        grade_distribution,
        recent_average: round_2_decimals(recent_average),
        trend,
    })
}

/// Newest first. Stored dates are normalized UTC strings, so they order
/// lexicographically; ties keep store order.
pub fn sort_newest_first(results: &mut [ExamResult]) {
    results.sort_by(|a, b| b.exam_date.cmp(&a.exam_date));
}

/// Replaces each result's `examName` with its display name: the answer key's
/// name when `answerKeyId` resolves, else the stored `examName`, else
/// `"Unknown Exam"`.
pub fn resolve_exam_names(conn: &Connection, results: &mut [ExamResult]) -> StoreResult<()> {
    let mut key_names: HashMap<String, Option<String>> = HashMap::new();
    for r in results.iter_mut() {
        let key_name = match r.answer_key_id.as_deref() {
            Some(kid) => match key_names.get(kid) {
                Some(cached) => cached.clone(),
                None => {
                    let name = answer_keys::name_for(conn, kid)?;
                    key_names.insert(kid.to_string(), name.clone());
                    name
                }
            },
            None => None,
        };
        let own = r.exam_name.take().filter(|s| !s.trim().is_empty());
        r.exam_name = Some(
            key_name
                .or(own)
                .unwrap_or_else(|| UNKNOWN_EXAM.to_string()),
        );
    }
    Ok(())
}
