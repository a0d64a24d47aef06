use crate::ipc::error::ok;
use crate::ipc::helpers::{db_conn, not_found, optional_str, parse_record, required_str, store_err};
use crate::ipc::types::{AppState, Request};
use crate::store::students::{self, Student};
use serde_json::json;

fn handle_students_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return ok(&req.id, json!({ "students": [] }));
    };
    let rows = match optional_str(req, "classId") {
        Some(class_id) => students::get_by_class_with_class(conn, &class_id),
        None => students::get_all_with_class(conn),
    };
    match rows {
        Ok(students) => ok(&req.id, json!({ "students": students })),
        Err(e) => store_err(req, e),
    }
}

fn handle_students_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let student_id = match required_str(req, "studentId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    match students::get_by_id_with_class(conn, &student_id) {
        Ok(Some(student)) => ok(&req.id, json!({ "student": student })),
        Ok(None) => not_found(req, "student"),
        Err(e) => store_err(req, e),
    }
}

fn handle_students_save(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let student: Student = match parse_record(req, "student") {
        Ok(v) => v,
        Err(e) => return e,
    };
    match students::save(conn, &student) {
        Ok(stored) => ok(&req.id, json!({ "student": stored })),
        Err(e) => store_err(req, e),
    }
}

fn handle_students_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let student_id = match required_str(req, "studentId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    match students::delete(conn, &student_id) {
        Ok(outcome) => ok(&req.id, json!(outcome)),
        Err(e) => store_err(req, e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "students.list" => Some(handle_students_list(state, req)),
        "students.get" => Some(handle_students_get(state, req)),
        "students.save" => Some(handle_students_save(state, req)),
        "students.delete" => Some(handle_students_delete(state, req)),
        _ => None,
    }
}
