use crate::ipc::error::ok;
use crate::ipc::helpers::{db_conn, not_found, parse_record, required_str, store_err};
use crate::ipc::types::{AppState, Request};
use crate::store::answer_keys::{self, AnswerKey};
use serde_json::json;

fn handle_answer_keys_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return ok(&req.id, json!({ "answerKeys": [] }));
    };
    match answer_keys::get_all(conn) {
        Ok(keys) => ok(&req.id, json!({ "answerKeys": keys })),
        Err(e) => store_err(req, e),
    }
}

fn handle_answer_keys_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let key_id = match required_str(req, "answerKeyId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    match answer_keys::get_by_id(conn, &key_id) {
        Ok(Some(key)) => ok(&req.id, json!({ "answerKey": key })),
        Ok(None) => not_found(req, "answer key"),
        Err(e) => store_err(req, e),
    }
}

fn handle_answer_keys_save(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let key: AnswerKey = match parse_record(req, "answerKey") {
        Ok(v) => v,
        Err(e) => return e,
    };
    match answer_keys::save(conn, &key) {
        Ok(stored) => ok(&req.id, json!({ "answerKey": stored })),
        Err(e) => store_err(req, e),
    }
}

fn handle_answer_keys_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let key_id = match required_str(req, "answerKeyId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    match answer_keys::delete(conn, &key_id) {
        Ok(deleted) => ok(&req.id, json!({ "deleted": deleted })),
        Err(e) => store_err(req, e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "answerKeys.list" => Some(handle_answer_keys_list(state, req)),
        "answerKeys.get" => Some(handle_answer_keys_get(state, req)),
        "answerKeys.save" => Some(handle_answer_keys_save(state, req)),
        "answerKeys.delete" => Some(handle_answer_keys_delete(state, req)),
        _ => None,
    }
}
