use crate::ipc::error::ok;
use crate::ipc::helpers::{db_conn, patch_object, store_err};
use crate::ipc::types::{AppState, Request};
use crate::store::settings;
use serde_json::json;

fn handle_settings_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    match settings::get_settings(conn) {
        Ok(s) => ok(&req.id, json!({ "settings": s })),
        Err(e) => store_err(req, e),
    }
}

fn handle_settings_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let patch = match patch_object(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    match settings::save_settings(conn, patch) {
        Ok(s) => ok(&req.id, json!({ "settings": s })),
        Err(e) => store_err(req, e),
    }
}

fn handle_profile_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    match settings::get_profile(conn) {
        Ok(p) => ok(&req.id, json!({ "profile": p })),
        Err(e) => store_err(req, e),
    }
}

fn handle_profile_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let patch = match patch_object(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    match settings::save_profile(conn, patch) {
        Ok(p) => ok(&req.id, json!({ "profile": p })),
        Err(e) => store_err(req, e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "settings.get" => Some(handle_settings_get(state, req)),
        "settings.update" => Some(handle_settings_update(state, req)),
        "profile.get" => Some(handle_profile_get(state, req)),
        "profile.update" => Some(handle_profile_update(state, req)),
        _ => None,
    }
}
