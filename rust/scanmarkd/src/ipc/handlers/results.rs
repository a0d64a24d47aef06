use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{db_conn, not_found, optional_str, parse_record, required_str, store_err};
use crate::ipc::types::{AppState, Request};
use crate::store::results::{self, ExamResult};
use serde_json::json;

fn handle_results_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return ok(&req.id, json!({ "results": [] }));
    };
    let rows = match (optional_str(req, "studentId"), optional_str(req, "answerKeyId")) {
        (Some(_), Some(_)) => {
            return err(
                &req.id,
                "bad_params",
                "filter by studentId or answerKeyId, not both",
                None,
            )
        }
        (Some(student_id), None) => results::get_by_student(conn, &student_id),
        (None, Some(key_id)) => results::get_by_answer_key(conn, &key_id),
        (None, None) => results::get_all(conn),
    };
    match rows {
        Ok(rows) => ok(&req.id, json!({ "results": rows })),
        Err(e) => store_err(req, e),
    }
}

fn handle_results_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let result_id = match required_str(req, "resultId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    match results::get_by_id(conn, &result_id) {
        Ok(Some(result)) => ok(&req.id, json!({ "result": result })),
        Ok(None) => not_found(req, "exam result"),
        Err(e) => store_err(req, e),
    }
}

fn handle_results_save(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let result: ExamResult = match parse_record(req, "result") {
        Ok(v) => v,
        Err(e) => return e,
    };
    match results::save(conn, &result) {
        Ok(stored) => ok(&req.id, json!({ "result": stored })),
        Err(e) => store_err(req, e),
    }
}

fn handle_results_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let result_id = match required_str(req, "resultId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    match results::delete(conn, &result_id) {
        Ok(deleted) => ok(&req.id, json!({ "deleted": deleted })),
        Err(e) => store_err(req, e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "results.list" => Some(handle_results_list(state, req)),
        "results.get" => Some(handle_results_get(state, req)),
        "results.save" => Some(handle_results_save(state, req)),
        "results.delete" => Some(handle_results_delete(state, req)),
        _ => None,
    }
}
