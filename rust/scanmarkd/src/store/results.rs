use super::{
    normalize_timestamp, now_ts, optional_text, required_text, students, StoreError, StoreResult,
};
use rusqlite::{Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

/// One graded (or not yet graded) sheet. `student_id` references
/// `Student::id`; `percentage: None` means ungraded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamResult {
    pub id: String,
    pub student_id: String,
    #[serde(default)]
    pub answer_key_id: Option<String>,
    #[serde(default)]
    pub exam_name: Option<String>,
    pub exam_date: String,
    #[serde(default)]
    pub percentage: Option<f64>,
    #[serde(default)]
    pub grade: Option<String>,
    #[serde(default)]
    pub passed: bool,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

const SELECT_COLUMNS: &str = "id, student_id, answer_key_id, exam_name, exam_date, percentage,
     grade, passed, created_at, updated_at";

fn from_row(r: &Row<'_>) -> rusqlite::Result<ExamResult> {
    let passed: i64 = r.get(7)?;
    Ok(ExamResult {
        id: r.get(0)?,
        student_id: r.get(1)?,
        answer_key_id: r.get(2)?,
        exam_name: r.get(3)?,
        exam_date: r.get(4)?,
        percentage: r.get(5)?,
        grade: r.get(6)?,
        passed: passed != 0,
        created_at: r.get(8)?,
        updated_at: r.get(9)?,
    })
}

fn query(
    conn: &Connection,
    filter: &str,
    params: impl rusqlite::Params,
) -> StoreResult<Vec<ExamResult>> {
    let sql = format!(
        "SELECT {} FROM exam_results {} ORDER BY rowid",
        SELECT_COLUMNS, filter
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params, from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn get_all(conn: &Connection) -> StoreResult<Vec<ExamResult>> {
    query(conn, "", [])
}

pub fn get_by_student(conn: &Connection, student_id: &str) -> StoreResult<Vec<ExamResult>> {
    query(conn, "WHERE student_id = ?", [student_id])
}

pub fn get_by_answer_key(conn: &Connection, answer_key_id: &str) -> StoreResult<Vec<ExamResult>> {
    query(conn, "WHERE answer_key_id = ?", [answer_key_id])
}

pub fn get_by_id(conn: &Connection, id: &str) -> StoreResult<Option<ExamResult>> {
    let row = conn
        .query_row(
            &format!("SELECT {} FROM exam_results WHERE id = ?", SELECT_COLUMNS),
            [id],
            from_row,
        )
        .optional()?;
    Ok(row)
}

/// Upsert by id. The owning student must exist; `answerKeyId` is not checked
/// because display names fall back to `examName`. `passed` is stored as given.
pub fn save(conn: &Connection, result: &ExamResult) -> StoreResult<ExamResult> {
    let id = required_text(&result.id, "id")?;
    let student_id = required_text(&result.student_id, "studentId")?;
    let answer_key_id = optional_text(result.answer_key_id.as_deref());
    let exam_name = optional_text(result.exam_name.as_deref());
    let exam_date = normalize_timestamp(&result.exam_date, "examDate")?;
    if let Some(p) = result.percentage {
        if !p.is_finite() || !(0.0..=100.0).contains(&p) {
            return Err(StoreError::validation(format!(
                "percentage must be within 0..=100, got {}",
                p
            )));
        }
    }
    let grade = optional_text(result.grade.as_deref());
    let passed = if result.passed { 1 } else { 0 };
    let now = now_ts();

    let tx = conn.unchecked_transaction()?;
    if !students::exists(&tx, &student_id)? {
        return Err(StoreError::validation(format!(
            "student not found: {}",
            student_id
        )));
    }
    tx.execute(
        "INSERT INTO exam_results(
           id, student_id, answer_key_id, exam_name, exam_date,
           percentage, grade, passed, created_at, updated_at
         ) VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
         ON CONFLICT(id) DO UPDATE SET
           student_id = excluded.student_id,
           answer_key_id = excluded.answer_key_id,
           exam_name = excluded.exam_name,
           exam_date = excluded.exam_date,
           percentage = excluded.percentage,
           grade = excluded.grade,
           passed = excluded.passed,
           updated_at = excluded.updated_at",
        (
            &id,
            &student_id,
            answer_key_id.as_deref(),
            exam_name.as_deref(),
            &exam_date,
            result.percentage,
            grade.as_deref(),
            passed,
            &now,
        ),
    )?;
    let stored = tx.query_row(
        &format!("SELECT {} FROM exam_results WHERE id = ?", SELECT_COLUMNS),
        [&id],
        from_row,
    )?;
    tx.commit()?;

    tracing::debug!(result_id = %id, student_id = %student_id, "exam result saved");
    Ok(stored)
}

/// Unconditional delete; an unknown id is a no-op.
pub fn delete(conn: &Connection, id: &str) -> StoreResult<bool> {
    let changed = conn.execute("DELETE FROM exam_results WHERE id = ?", [id])?;
    tracing::debug!(result_id = %id, changed, "exam result delete");
    Ok(changed > 0)
}
