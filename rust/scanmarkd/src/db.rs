use rusqlite::{Connection, OptionalExtension};
use std::path::{Path, PathBuf};

pub const DB_FILE_NAME: &str = "scanmark.sqlite3";

pub fn db_path(workspace: &Path) -> PathBuf {
    workspace.join(DB_FILE_NAME)
}

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let conn = Connection::open(db_path(workspace))?;
    init_schema(&conn)?;
    tracing::info!(workspace = %workspace.display(), "workspace database opened");
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> anyhow::Result<()> {
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS classes(
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            section TEXT,
            academic_year TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS students(
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            student_number TEXT NOT NULL,
            email TEXT,
            class_id TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY(class_id) REFERENCES classes(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_students_class ON students(class_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS answer_keys(
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            definition_json TEXT NOT NULL DEFAULT 'null',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;
    ensure_answer_keys_definition(conn)?;

    // answer_key_id has no FOREIGN KEY: answer keys may be deleted while
    // results that mention them are kept (the exam name falls back).
    conn.execute(
        "CREATE TABLE IF NOT EXISTS exam_results(
            id TEXT PRIMARY KEY,
            student_id TEXT NOT NULL,
            answer_key_id TEXT,
            exam_name TEXT,
            exam_date TEXT NOT NULL,
            percentage REAL,
            grade TEXT,
            passed INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY(student_id) REFERENCES students(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_exam_results_student ON exam_results(student_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_exam_results_answer_key ON exam_results(answer_key_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS settings(
            key TEXT PRIMARY KEY,
            value_json TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    Ok(())
}

fn ensure_answer_keys_definition(conn: &Connection) -> anyhow::Result<()> {
    // Early workspaces stored answer keys by name only.
    if table_has_column(conn, "answer_keys", "definition_json")? {
        return Ok(());
    }
    tracing::info!("migrating answer_keys: adding definition_json");
    conn.execute(
        "ALTER TABLE answer_keys ADD COLUMN definition_json TEXT NOT NULL DEFAULT 'null'",
        [],
    )?;
    Ok(())
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> anyhow::Result<bool> {
    let sql = format!("PRAGMA table_info({})", table);
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        if name == column {
            return Ok(true);
        }
    }
    Ok(false)
}

pub fn settings_get_json(
    conn: &Connection,
    key: &str,
) -> rusqlite::Result<Option<serde_json::Value>> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT value_json FROM settings WHERE key = ?",
            [key],
            |r| r.get(0),
        )
        .optional()?;
    Ok(raw.map(|s| {
        serde_json::from_str(&s).unwrap_or_else(|e| {
            tracing::warn!(key, error = %e, "stored settings value is not valid JSON; ignoring");
            serde_json::Value::Null
        })
    }))
}

pub fn settings_set_json(
    conn: &Connection,
    key: &str,
    value: &serde_json::Value,
) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO settings(key, value_json, updated_at)
         VALUES(?, ?, strftime('%Y-%m-%dT%H:%M:%fZ','now'))
         ON CONFLICT(key) DO UPDATE SET
           value_json = excluded.value_json,
           updated_at = excluded.updated_at",
        (key, value.to_string()),
    )?;
    Ok(())
}
