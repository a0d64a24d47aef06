use super::{is_valid_email, now_ts, StoreError, StoreResult};
use crate::db;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Singleton records kept in the `settings` key/value table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Settings,
    Profile,
}

impl Section {
    fn key(self) -> &'static str {
        match self {
            Self::Settings => "app.settings",
            Self::Profile => "app.profile",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Settings => "settings",
            Self::Profile => "profile",
        }
    }
}

fn default_section(section: Section) -> Value {
    match section {
        Section::Settings => json!({
            "skipVerifyDetection": true
        }),
        Section::Profile => json!({
            "name": null,
            "email": null,
            "school": null,
            "department": null,
            "phone": null,
            "bio": null,
            "profileImage": null,
            "updatedAt": null
        }),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub skip_verify_detection: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            skip_verify_detection: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub name: Option<String>,
    pub email: Option<String>,
    pub school: Option<String>,
    pub department: Option<String>,
    pub phone: Option<String>,
    pub bio: Option<String>,
    pub profile_image: Option<String>,
    pub updated_at: Option<String>,
}

fn same_kind(default: &Value, stored: &Value) -> bool {
    match default {
        Value::Null => stored.is_null() || stored.is_string(),
        Value::Bool(_) => stored.is_boolean(),
        Value::Number(_) => stored.is_number(),
        Value::String(_) => stored.is_string(),
        _ => false,
    }
}

/// Stored values overlaid on the defaults. Unknown or mistyped stored fields
/// are dropped. The defaults are persisted on first read.
pub fn load_section(conn: &Connection, section: Section) -> StoreResult<Value> {
    let mut merged = default_section(section);
    let Some(stored) = db::settings_get_json(conn, section.key())? else {
        db::settings_set_json(conn, section.key(), &merged)?;
        tracing::debug!(section = section.label(), "created default record");
        return Ok(merged);
    };
    if let (Some(out), Some(stored)) = (merged.as_object_mut(), stored.as_object()) {
        for (k, v) in stored {
            if out.get(k).is_some_and(|d| same_kind(d, v)) {
                out.insert(k.clone(), v.clone());
            } else {
                tracing::debug!(section = section.label(), field = %k, "ignoring stored field");
            }
        }
    }
    Ok(merged)
}

fn parse_bool(v: &Value, key: &str) -> StoreResult<bool> {
    v.as_bool()
        .ok_or_else(|| StoreError::validation(format!("{} must be boolean", key)))
}

fn parse_nullable_string_max(v: &Value, key: &str, max_len: usize) -> StoreResult<Value> {
    if v.is_null() {
        return Ok(Value::Null);
    }
    let s = v
        .as_str()
        .ok_or_else(|| StoreError::validation(format!("{} must be string or null", key)))?
        .trim();
    if s.chars().count() > max_len {
        return Err(StoreError::validation(format!(
            "{} length must be <= {}",
            key, max_len
        )));
    }
    if s.is_empty() {
        return Ok(Value::Null);
    }
    Ok(Value::String(s.to_string()))
}

fn merge_section_patch(
    section: Section,
    current: &mut Map<String, Value>,
    patch: &Map<String, Value>,
) -> StoreResult<()> {
    for (k, v) in patch {
        let value = match section {
            Section::Settings => match k.as_str() {
                "skipVerifyDetection" => Value::Bool(parse_bool(v, k)?),
                _ => return Err(StoreError::validation(format!("unknown settings field: {}", k))),
            },
            Section::Profile => match k.as_str() {
                "name" => parse_nullable_string_max(v, k, 120)?,
                "email" => {
                    let parsed = parse_nullable_string_max(v, k, 254)?;
                    if let Some(e) = parsed.as_str() {
                        if !is_valid_email(e) {
                            return Err(StoreError::validation(format!("invalid email: {}", e)));
                        }
                    }
                    parsed
                }
                "school" | "department" => parse_nullable_string_max(v, k, 200)?,
                "phone" => parse_nullable_string_max(v, k, 40)?,
                "bio" => parse_nullable_string_max(v, k, 2000)?,
                "profileImage" => parse_nullable_string_max(v, k, 4096)?,
                _ => return Err(StoreError::validation(format!("unknown profile field: {}", k))),
            },
        };
        current.insert(k.clone(), value);
    }
    if section == Section::Profile {
        current.insert("updatedAt".into(), Value::String(now_ts()));
    }
    Ok(())
}

/// Read-modify-write of one section. The whole record is persisted; fields
/// absent from `patch` keep their current values.
pub fn update_section(
    conn: &Connection,
    section: Section,
    patch: &Map<String, Value>,
) -> StoreResult<Value> {
    let tx = conn.unchecked_transaction()?;
    let mut current = load_section(&tx, section)?;
    let Some(obj) = current.as_object_mut() else {
        return Err(StoreError::validation("stored record must be a JSON object"));
    };
    merge_section_patch(section, obj, patch)?;
    db::settings_set_json(&tx, section.key(), &current)?;
    tx.commit()?;
    tracing::debug!(section = section.label(), fields = patch.len(), "section updated");
    Ok(current)
}

fn typed<T: serde::de::DeserializeOwned>(section: Section, value: Value) -> StoreResult<T> {
    serde_json::from_value(value).map_err(|e| {
        StoreError::validation(format!("{} record is malformed: {}", section.label(), e))
    })
}

pub fn get_settings(conn: &Connection) -> StoreResult<Settings> {
    typed(Section::Settings, load_section(conn, Section::Settings)?)
}

pub fn save_settings(conn: &Connection, patch: &Map<String, Value>) -> StoreResult<Settings> {
    typed(
        Section::Settings,
        update_section(conn, Section::Settings, patch)?,
    )
}

pub fn get_profile(conn: &Connection) -> StoreResult<Profile> {
    typed(Section::Profile, load_section(conn, Section::Profile)?)
}

pub fn save_profile(conn: &Connection, patch: &Map<String, Value>) -> StoreResult<Profile> {
    typed(Section::Profile, update_section(conn, Section::Profile, patch)?)
}
