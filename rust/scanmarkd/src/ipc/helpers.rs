use crate::ipc::error::err;
use crate::ipc::types::{AppState, Request};
use crate::store::StoreError;
use rusqlite::Connection;
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use uuid::Uuid;

pub fn required_str(req: &Request, key: &str) -> Result<String, Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))
}

pub fn optional_str(req: &Request, key: &str) -> Option<String> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn db_conn<'a>(state: &'a AppState, req: &Request) -> Result<&'a Connection, Value> {
    state
        .db
        .as_ref()
        .ok_or_else(|| err(&req.id, "no_workspace", "select a workspace first", None))
}

/// Deserializes `params[key]` into a record. A missing or blank `id` gets a
/// fresh UUID, so creating and updating share one method.
pub fn parse_record<T: DeserializeOwned>(req: &Request, key: &str) -> Result<T, Value> {
    let Some(obj) = req.params.get(key).and_then(|v| v.as_object()) else {
        return Err(err(
            &req.id,
            "bad_params",
            format!("{} must be an object", key),
            None,
        ));
    };
    let mut obj = obj.clone();
    let has_id = obj
        .get("id")
        .and_then(|v| v.as_str())
        .is_some_and(|s| !s.trim().is_empty());
    if !has_id {
        obj.insert("id".into(), Value::String(Uuid::new_v4().to_string()));
    }
    serde_json::from_value(Value::Object(obj)).map_err(|e| {
        err(
            &req.id,
            "bad_params",
            format!("invalid {}: {}", key, e),
            None,
        )
    })
}

pub fn patch_object<'a>(req: &'a Request) -> Result<&'a Map<String, Value>, Value> {
    req.params
        .get("patch")
        .and_then(|v| v.as_object())
        .ok_or_else(|| err(&req.id, "bad_params", "patch must be an object", None))
}

pub fn store_err(req: &Request, e: StoreError) -> Value {
    let details = match &e {
        StoreError::ConstraintViolation {
            blocking_students, ..
        } => Some(json!({ "blockingStudents": blocking_students })),
        StoreError::StorageUnavailable(inner) => {
            tracing::warn!(method = %req.method, error = %inner, "storage failure");
            None
        }
        StoreError::Validation(_) => None,
    };
    err(&req.id, e.code(), e.to_string(), details)
}

pub fn not_found(req: &Request, what: &str) -> Value {
    err(&req.id, "not_found", format!("{} not found", what), None)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(method: &str) -> Request {
        Request {
            id: "7".into(),
            method: method.into(),
            params: json!({}),
        }
    }

    #[test]
    fn storage_failures_map_to_storage_unavailable() {
        let resp = store_err(
            &req("classes.save"),
            StoreError::StorageUnavailable(rusqlite::Error::InvalidQuery),
        );
        assert_eq!(resp["ok"], json!(false));
        assert_eq!(resp["error"]["code"], json!("storage_unavailable"));
        assert!(resp["error"].get("details").is_none());
    }

    #[test]
    fn constraint_violation_carries_blocking_count() {
        let resp = store_err(
            &req("classes.delete"),
            StoreError::ConstraintViolation {
                blocking_students: 3,
                message: "This class has 3 student(s).".into(),
            },
        );
        assert_eq!(resp["error"]["code"], json!("constraint_violation"));
        assert_eq!(resp["error"]["details"]["blockingStudents"], json!(3));
    }
}
