use super::{now_ts, required_text, StoreResult};
use rusqlite::{Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

/// `definition` belongs to the grading pipeline and is stored verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerKey {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub definition: serde_json::Value,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

const SELECT_COLUMNS: &str = "id, name, definition_json, created_at, updated_at";

fn from_row(r: &Row<'_>) -> rusqlite::Result<AnswerKey> {
    let raw: String = r.get(2)?;
    let definition = serde_json::from_str(&raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(AnswerKey {
        id: r.get(0)?,
        name: r.get(1)?,
        definition,
        created_at: r.get(3)?,
        updated_at: r.get(4)?,
    })
}

pub fn get_all(conn: &Connection) -> StoreResult<Vec<AnswerKey>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM answer_keys ORDER BY rowid",
        SELECT_COLUMNS
    ))?;
    let rows = stmt
        .query_map([], from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn get_by_id(conn: &Connection, id: &str) -> StoreResult<Option<AnswerKey>> {
    let row = conn
        .query_row(
            &format!("SELECT {} FROM answer_keys WHERE id = ?", SELECT_COLUMNS),
            [id],
            from_row,
        )
        .optional()?;
    Ok(row)
}

pub fn name_for(conn: &Connection, id: &str) -> StoreResult<Option<String>> {
    let name = conn
        .query_row("SELECT name FROM answer_keys WHERE id = ?", [id], |r| {
            r.get(0)
        })
        .optional()?;
    Ok(name)
}

pub fn save(conn: &Connection, key: &AnswerKey) -> StoreResult<AnswerKey> {
    let id = required_text(&key.id, "id")?;
    let name = required_text(&key.name, "name")?;
    let definition = key.definition.to_string();
    let now = now_ts();

    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "INSERT INTO answer_keys(id, name, definition_json, created_at, updated_at)
         VALUES(?1, ?2, ?3, ?4, ?4)
         ON CONFLICT(id) DO UPDATE SET
           name = excluded.name,
           definition_json = excluded.definition_json,
           updated_at = excluded.updated_at",
        (&id, &name, &definition, &now),
    )?;
    let stored = tx.query_row(
        &format!("SELECT {} FROM answer_keys WHERE id = ?", SELECT_COLUMNS),
        [&id],
        from_row,
    )?;
    tx.commit()?;

    tracing::debug!(answer_key_id = %id, "answer key saved");
    Ok(stored)
}

/// Unconditional delete. Results that point at the key keep their
/// `answerKeyId`; name resolution falls back for them.
pub fn delete(conn: &Connection, id: &str) -> StoreResult<bool> {
    let changed = conn.execute("DELETE FROM answer_keys WHERE id = ?", [id])?;
    tracing::debug!(answer_key_id = %id, changed, "answer key delete");
    Ok(changed > 0)
}
