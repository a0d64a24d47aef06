use crate::analytics;
use crate::ipc::error::ok;
use crate::ipc::helpers::{db_conn, not_found, required_str, store_err};
use crate::ipc::types::{AppState, Request};
use crate::store::{results, students};
use serde_json::json;

fn handle_analytics_student_summary(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let student_id = match required_str(req, "studentId") {
        Ok(v) => v,
        Err(e) => return e,
    };

    let student = match students::get_by_id_with_class(conn, &student_id) {
        Ok(Some(v)) => v,
        Ok(None) => return not_found(req, "student"),
        Err(e) => return store_err(req, e),
    };
    let mut history = match results::get_by_student(conn, &student_id) {
        Ok(v) => v,
        Err(e) => return store_err(req, e),
    };
    analytics::sort_newest_first(&mut history);
    if let Err(e) = analytics::resolve_exam_names(conn, &mut history) {
        return store_err(req, e);
    }
    let summary = analytics::summarize(&history);

    ok(
        &req.id,
        json!({
            "student": student,
            "results": history,
            "summary": summary
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "analytics.student.summary" => Some(handle_analytics_student_summary(state, req)),
        _ => None,
    }
}
