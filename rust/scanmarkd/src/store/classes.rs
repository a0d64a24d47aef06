use super::{now_ts, optional_text, required_text, StoreError, StoreResult};
use rusqlite::{Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Class {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub section: Option<String>,
    #[serde(default)]
    pub academic_year: Option<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassWithCount {
    #[serde(flatten)]
    pub class: Class,
    pub student_count: usize,
}

const SELECT_COLUMNS: &str = "id, name, section, academic_year, created_at, updated_at";

fn from_row(r: &Row<'_>) -> rusqlite::Result<Class> {
    Ok(Class {
        id: r.get(0)?,
        name: r.get(1)?,
        section: r.get(2)?,
        academic_year: r.get(3)?,
        created_at: r.get(4)?,
        updated_at: r.get(5)?,
    })
}

pub fn get_all(conn: &Connection) -> StoreResult<Vec<Class>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM classes ORDER BY rowid",
        SELECT_COLUMNS
    ))?;
    let rows = stmt
        .query_map([], from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Every class with the number of students currently assigned to it.
pub fn get_all_with_counts(conn: &Connection) -> StoreResult<Vec<ClassWithCount>> {
    // Correlated subquery keeps insertion order and avoids join fan-out.
    let mut stmt = conn.prepare(
        "SELECT c.id, c.name, c.section, c.academic_year, c.created_at, c.updated_at,
           (SELECT COUNT(*) FROM students s WHERE s.class_id = c.id) AS student_count
         FROM classes c
         ORDER BY c.rowid",
    )?;
    let rows = stmt
        .query_map([], |r| {
            let student_count: i64 = r.get(6)?;
            Ok(ClassWithCount {
                class: from_row(r)?,
                student_count: student_count as usize,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn get_by_id(conn: &Connection, id: &str) -> StoreResult<Option<Class>> {
    let row = conn
        .query_row(
            &format!("SELECT {} FROM classes WHERE id = ?", SELECT_COLUMNS),
            [id],
            from_row,
        )
        .optional()?;
    Ok(row)
}

pub fn exists(conn: &Connection, id: &str) -> StoreResult<bool> {
    let hit: Option<i64> = conn
        .query_row("SELECT 1 FROM classes WHERE id = ?", [id], |r| r.get(0))
        .optional()?;
    Ok(hit.is_some())
}

pub fn student_count(conn: &Connection, id: &str) -> StoreResult<usize> {
    let n: i64 = conn.query_row(
        "SELECT COUNT(*) FROM students WHERE class_id = ?",
        [id],
        |r| r.get(0),
    )?;
    Ok(n as usize)
}

/// Upsert by id. `createdAt`/`updatedAt` on the input are ignored; the stored
/// record is returned.
pub fn save(conn: &Connection, class: &Class) -> StoreResult<Class> {
    let id = required_text(&class.id, "id")?;
    let name = required_text(&class.name, "name")?;
    let section = optional_text(class.section.as_deref());
    let academic_year = optional_text(class.academic_year.as_deref());
    let now = now_ts();

    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "INSERT INTO classes(id, name, section, academic_year, created_at, updated_at)
         VALUES(?1, ?2, ?3, ?4, ?5, ?5)
         ON CONFLICT(id) DO UPDATE SET
           name = excluded.name,
           section = excluded.section,
           academic_year = excluded.academic_year,
           updated_at = excluded.updated_at",
        (&id, &name, section.as_deref(), academic_year.as_deref(), &now),
    )?;
    let stored = tx.query_row(
        &format!("SELECT {} FROM classes WHERE id = ?", SELECT_COLUMNS),
        [&id],
        from_row,
    )?;
    tx.commit()?;

    tracing::debug!(class_id = %id, "class saved");
    Ok(stored)
}

/// Deletes a class that no student references. Returns whether a row was
/// removed; an unknown id is a no-op.
pub fn delete(conn: &Connection, id: &str) -> StoreResult<bool> {
    let tx = conn.unchecked_transaction()?;
    let blocking = student_count(&tx, id)?;
    if blocking > 0 {
        tracing::info!(class_id = %id, blocking, "class delete blocked by students");
        return Err(StoreError::ConstraintViolation {
            blocking_students: blocking,
            message: format!(
                "This class has {} student(s). Remove or reassign them before deleting the class.",
                blocking
            ),
        });
    }
    let changed = tx.execute("DELETE FROM classes WHERE id = ?", [id])?;
    tx.commit()?;

    tracing::debug!(class_id = %id, changed, "class delete");
    Ok(changed > 0)
}
