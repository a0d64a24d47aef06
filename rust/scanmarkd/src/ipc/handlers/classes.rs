use crate::ipc::error::ok;
use crate::ipc::helpers::{db_conn, not_found, parse_record, required_str, store_err};
use crate::ipc::types::{AppState, Request};
use crate::store::classes::{self, Class};
use serde_json::json;

fn handle_classes_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return ok(&req.id, json!({ "classes": [] }));
    };
    // Counts let the UI warn before a delete that would be blocked.
    match classes::get_all_with_counts(conn) {
        Ok(rows) => ok(&req.id, json!({ "classes": rows })),
        Err(e) => store_err(req, e),
    }
}

fn handle_classes_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let class_id = match required_str(req, "classId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    match classes::get_by_id(conn, &class_id) {
        Ok(Some(class)) => ok(&req.id, json!({ "class": class })),
        Ok(None) => not_found(req, "class"),
        Err(e) => store_err(req, e),
    }
}

fn handle_classes_save(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let class: Class = match parse_record(req, "class") {
        Ok(v) => v,
        Err(e) => return e,
    };
    match classes::save(conn, &class) {
        Ok(stored) => ok(&req.id, json!({ "class": stored })),
        Err(e) => store_err(req, e),
    }
}

fn handle_classes_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let class_id = match required_str(req, "classId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    match classes::delete(conn, &class_id) {
        Ok(deleted) => ok(&req.id, json!({ "deleted": deleted })),
        Err(e) => store_err(req, e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "classes.list" => Some(handle_classes_list(state, req)),
        "classes.get" => Some(handle_classes_get(state, req)),
        "classes.save" => Some(handle_classes_save(state, req)),
        "classes.delete" => Some(handle_classes_delete(state, req)),
        _ => None,
    }
}
