use super::{
    classes, is_valid_email, now_ts, optional_text, required_text, StoreError, StoreResult,
};
use rusqlite::{Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// `student_id` is the human-facing number printed on the sheet; `id` is the
/// record key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub name: String,
    pub student_id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub class_id: Option<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentWithClass {
    #[serde(flatten)]
    pub student: Student,
    pub class_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentDeletion {
    pub deleted: bool,
    pub removed_results: usize,
}

const SELECT_COLUMNS: &str =
    "id, name, student_number, email, class_id, created_at, updated_at";

fn from_row(r: &Row<'_>) -> rusqlite::Result<Student> {
    Ok(Student {
        id: r.get(0)?,
        name: r.get(1)?,
        student_id: r.get(2)?,
        email: r.get(3)?,
        class_id: r.get(4)?,
        created_at: r.get(5)?,
        updated_at: r.get(6)?,
    })
}

fn query(
    conn: &Connection,
    filter: &str,
    params: impl rusqlite::Params,
) -> StoreResult<Vec<Student>> {
    let sql = format!(
        "SELECT {} FROM students {} ORDER BY rowid",
        SELECT_COLUMNS, filter
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params, from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn class_name_for(conn: &Connection, class_id: Option<&str>) -> StoreResult<Option<String>> {
    match class_id {
        Some(cid) => Ok(classes::get_by_id(conn, cid)?.map(|c| c.name)),
        None => Ok(None),
    }
}

pub fn get_all(conn: &Connection) -> StoreResult<Vec<Student>> {
    query(conn, "", [])
}

/// Every student with its class name. A dangling or empty `classId` yields
/// `class_name: None`.
pub fn get_all_with_class(conn: &Connection) -> StoreResult<Vec<StudentWithClass>> {
    let names: HashMap<String, String> = classes::get_all(conn)?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect();
    Ok(get_all(conn)?
        .into_iter()
        .map(|student| {
            let class_name = student
                .class_id
                .as_deref()
                .and_then(|cid| names.get(cid).cloned());
            StudentWithClass {
                student,
                class_name,
            }
        })
        .collect())
}

pub fn get_by_class(conn: &Connection, class_id: &str) -> StoreResult<Vec<Student>> {
    query(conn, "WHERE class_id = ?", [class_id])
}

pub fn get_by_class_with_class(
    conn: &Connection,
    class_id: &str,
) -> StoreResult<Vec<StudentWithClass>> {
    let class_name = class_name_for(conn, Some(class_id))?;
    Ok(get_by_class(conn, class_id)?
        .into_iter()
        .map(|student| StudentWithClass {
            student,
            class_name: class_name.clone(),
        })
        .collect())
}

pub fn get_by_id(conn: &Connection, id: &str) -> StoreResult<Option<Student>> {
    let row = conn
        .query_row(
            &format!("SELECT {} FROM students WHERE id = ?", SELECT_COLUMNS),
            [id],
            from_row,
        )
        .optional()?;
    Ok(row)
}

pub fn get_by_id_with_class(conn: &Connection, id: &str) -> StoreResult<Option<StudentWithClass>> {
    let Some(student) = get_by_id(conn, id)? else {
        return Ok(None);
    };
    let class_name = class_name_for(conn, student.class_id.as_deref())?;
    Ok(Some(StudentWithClass {
        student,
        class_name,
    }))
}

pub fn exists(conn: &Connection, id: &str) -> StoreResult<bool> {
    let hit: Option<i64> = conn
        .query_row("SELECT 1 FROM students WHERE id = ?", [id], |r| r.get(0))
        .optional()?;
    Ok(hit.is_some())
}

/// Upsert by id. A `classId` must name an existing class; `None` leaves the
/// student unassigned.
pub fn save(conn: &Connection, student: &Student) -> StoreResult<Student> {
    let id = required_text(&student.id, "id")?;
    let name = required_text(&student.name, "name")?;
    let student_number = required_text(&student.student_id, "studentId")?;
    let email = optional_text(student.email.as_deref());
    if let Some(e) = email.as_deref() {
        if !is_valid_email(e) {
            return Err(StoreError::validation(format!("invalid email: {}", e)));
        }
    }
    let class_id = optional_text(student.class_id.as_deref());
    let now = now_ts();

    let tx = conn.unchecked_transaction()?;
    if let Some(cid) = class_id.as_deref() {
        if !classes::exists(&tx, cid)? {
            return Err(StoreError::validation(format!("class not found: {}", cid)));
        }
    }
    tx.execute(
        "INSERT INTO students(id, name, student_number, email, class_id, created_at, updated_at)
         VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?6)
         ON CONFLICT(id) DO UPDATE SET
           name = excluded.name,
           student_number = excluded.student_number,
           email = excluded.email,
           class_id = excluded.class_id,
           updated_at = excluded.updated_at",
        (
            &id,
            &name,
            &student_number,
            email.as_deref(),
            class_id.as_deref(),
            &now,
        ),
    )?;
    let stored = tx.query_row(
        &format!("SELECT {} FROM students WHERE id = ?", SELECT_COLUMNS),
        [&id],
        from_row,
    )?;
    tx.commit()?;

    tracing::debug!(student_id = %id, "student saved");
    Ok(stored)
}

/// Deletes the student and, in the same transaction, every exam result that
/// belongs to it. An unknown id is a no-op.
pub fn delete(conn: &Connection, id: &str) -> StoreResult<StudentDeletion> {
    let tx = conn.unchecked_transaction()?;
    if !exists(&tx, id)? {
        return Ok(StudentDeletion {
            deleted: false,
            removed_results: 0,
        });
    }
    let removed_results = tx.execute("DELETE FROM exam_results WHERE student_id = ?", [id])?;
    tx.execute("DELETE FROM students WHERE id = ?", [id])?;
    tx.commit()?;

    tracing::debug!(student_id = %id, removed_results, "student deleted");
    Ok(StudentDeletion {
        deleted: true,
        removed_results,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::classes::Class;
    use crate::store::results::{self, ExamResult};
    use crate::store::test_conn;

    fn student(id: &str, class_id: Option<&str>) -> Student {
        Student {
            id: id.into(),
            name: "Ada Lovelace".into(),
            student_id: "S-001".into(),
            email: None,
            class_id: class_id.map(|s| s.to_string()),
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    fn result_for(id: &str, student_id: &str) -> ExamResult {
        ExamResult {
            id: id.into(),
            student_id: student_id.into(),
            answer_key_id: None,
            exam_name: Some("Quiz".into()),
            exam_date: "2024-05-01T09:00:00Z".into(),
            percentage: Some(75.0),
            grade: Some("B".into()),
            passed: true,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn save_validates_required_fields_and_email() {
        let conn = test_conn();
        let mut s = student("s1", None);
        s.name = " ".into();
        assert!(matches!(save(&conn, &s), Err(StoreError::Validation(_))));

        let mut s = student("s1", None);
        s.student_id = "".into();
        assert!(matches!(save(&conn, &s), Err(StoreError::Validation(_))));

        let mut s = student("s1", None);
        s.email = Some("not-an-email".into());
        assert!(matches!(save(&conn, &s), Err(StoreError::Validation(_))));

        let mut s = student("s1", None);
        s.email = Some("   ".into());
        let stored = save(&conn, &s).expect("blank email is treated as absent");
        assert_eq!(stored.email, None);
    }

    #[test]
    fn save_rejects_unknown_class() {
        let conn = test_conn();
        let err = save(&conn, &student("s1", Some("missing"))).expect_err("unknown class");
        assert!(matches!(err, StoreError::Validation(_)));
        assert!(get_all(&conn).expect("all").is_empty());
    }

    #[test]
    fn upsert_preserves_created_at_and_refreshes_updated_at() {
        let conn = test_conn();
        let first = save(&conn, &student("s1", None)).expect("insert");
        std::thread::sleep(std::time::Duration::from_millis(5));
        let mut changed = student("s1", None);
        changed.name = "Ada King".into();
        let second = save(&conn, &changed).expect("update");

        assert_eq!(second.created_at, first.created_at);
        assert!(second.updated_at > first.updated_at);
        assert_eq!(second.name, "Ada King");
        assert_eq!(get_all(&conn).expect("all").len(), 1);
    }

    #[test]
    fn lookup_by_class_and_class_name_join() {
        let conn = test_conn();
        classes::save(
            &conn,
            &Class {
                id: "c1".into(),
                name: "Grade 7".into(),
                section: Some("B".into()),
                academic_year: None,
                created_at: String::new(),
                updated_at: String::new(),
            },
        )
        .expect("save class");
        save(&conn, &student("s1", Some("c1"))).expect("s1");
        save(&conn, &student("s2", None)).expect("s2");

        let in_class = get_by_class(&conn, "c1").expect("by class");
        assert_eq!(in_class.len(), 1);
        assert_eq!(in_class[0].id, "s1");
        assert!(get_by_class(&conn, "nope").expect("empty").is_empty());

        let joined = get_by_id_with_class(&conn, "s1").expect("get").expect("exists");
        assert_eq!(joined.class_name.as_deref(), Some("Grade 7"));
        let unassigned = get_by_id_with_class(&conn, "s2").expect("get").expect("exists");
        assert_eq!(unassigned.class_name, None);
        assert_eq!(get_by_id(&conn, "ghost").expect("get"), None);
    }

    #[test]
    fn delete_cascades_only_own_results() {
        let conn = test_conn();
        save(&conn, &student("s1", None)).expect("s1");
        save(&conn, &student("s2", None)).expect("s2");
        results::save(&conn, &result_for("r1", "s1")).expect("r1");
        results::save(&conn, &result_for("r2", "s1")).expect("r2");
        results::save(&conn, &result_for("r3", "s2")).expect("r3");

        let outcome = delete(&conn, "s1").expect("delete");
        assert_eq!(
            outcome,
            StudentDeletion {
                deleted: true,
                removed_results: 2
            }
        );
        assert_eq!(get_by_id(&conn, "s1").expect("get"), None);
        assert!(results::get_by_student(&conn, "s1").expect("r").is_empty());
        let remaining: Vec<String> = results::get_all(&conn)
            .expect("all")
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(remaining, vec!["r3"]);
    }

    #[test]
    fn delete_unknown_student_is_noop() {
        let conn = test_conn();
        let outcome = delete(&conn, "ghost").expect("delete");
        assert!(!outcome.deleted);
        assert_eq!(outcome.removed_results, 0);
    }

    #[test]
    fn class_names_resolve_for_every_listing() {
        let conn = test_conn();
        classes::save(
            &conn,
            &Class {
                id: "c1".into(),
                name: "Grade 8".into(),
                section: None,
                academic_year: None,
                created_at: String::new(),
                updated_at: String::new(),
            },
        )
        .expect("save class");
        save(&conn, &student("s1", None)).expect("s1");
        save(&conn, &student("s2", Some("c1"))).expect("s2");

        let all = get_all_with_class(&conn).expect("all");
        let names: Vec<(&str, Option<&str>)> = all
            .iter()
            .map(|s| (s.student.id.as_str(), s.class_name.as_deref()))
            .collect();
        assert_eq!(names, vec![("s1", None), ("s2", Some("Grade 8"))]);

        let in_class = get_by_class_with_class(&conn, "c1").expect("by class");
        assert_eq!(in_class.len(), 1);
        assert_eq!(in_class[0].class_name.as_deref(), Some("Grade 8"));
    }

    #[test]
    fn failed_delete_keeps_student_and_results() {
        let conn = test_conn();
        save(&conn, &student("s1", None)).expect("s1");
        results::save(&conn, &result_for("r1", "s1")).expect("r1");
        results::save(&conn, &result_for("r2", "s1")).expect("r2");
        conn.execute_batch(
            "CREATE TRIGGER lock_students BEFORE DELETE ON students
             BEGIN SELECT RAISE(ABORT, 'students are locked'); END;",
        )
        .expect("install trigger");

        let err = delete(&conn, "s1").expect_err("trigger aborts the delete");
        assert!(matches!(err, StoreError::StorageUnavailable(_)));
        assert_eq!(err.code(), "storage_unavailable");
        assert!(get_by_id(&conn, "s1").expect("get").is_some());
        assert_eq!(results::get_by_student(&conn, "s1").expect("results").len(), 2);
    }
}
