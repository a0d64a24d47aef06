use crate::backup;
use crate::db;
use crate::ipc::error::{err, ok};
use crate::ipc::handlers::core::open_workspace;
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use std::path::PathBuf;

fn workspace_param(state: &AppState, req: &Request) -> Option<PathBuf> {
    req.params
        .get("workspacePath")
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from)
        .or_else(|| state.workspace.clone())
}

fn handle_backup_export_workspace_bundle(state: &mut AppState, req: &Request) -> serde_json::Value {
    let out_path = match req.params.get("outPath").and_then(|v| v.as_str()) {
        Some(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => return err(&req.id, "bad_params", "missing outPath", None),
    };
    let Some(workspace_path) = workspace_param(state, req) else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    if let Some(conn) = state.db.as_ref() {
        let _ = conn.execute_batch("PRAGMA wal_checkpoint(FULL)");
    }

    let export = match backup::export_workspace_bundle(&workspace_path, &PathBuf::from(&out_path)) {
        Ok(v) => v,
        Err(e) => {
            tracing::error!(error = ?e, "bundle export failed");
            return err(
                &req.id,
                "backup_failed",
                e.to_string(),
                Some(json!({ "path": out_path })),
            );
        }
    };

    ok(
        &req.id,
        json!({
            "path": out_path,
            "bundleFormat": export.bundle_format,
            "entryCount": export.entry_count,
            "dbSha256": export.db_sha256
        }),
    )
}

fn handle_backup_import_workspace_bundle(state: &mut AppState, req: &Request) -> serde_json::Value {
    let in_path = match req.params.get("inPath").and_then(|v| v.as_str()) {
        Some(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => return err(&req.id, "bad_params", "missing inPath", None),
    };
    let Some(workspace_path) = workspace_param(state, req) else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let src = PathBuf::from(&in_path);
    if !src.is_file() {
        return err(
            &req.id,
            "not_found",
            "bundle file not found",
            Some(json!({ "path": in_path })),
        );
    }

    // Drop the open handle before the database file is replaced.
    let replacing_current = state.workspace.as_deref() == Some(workspace_path.as_path());
    if replacing_current {
        state.db = None;
    }

    let import = match backup::import_workspace_bundle(&src, &workspace_path, db::init_schema) {
        Ok(v) => v,
        Err(e) => {
            tracing::error!(error = ?e, "bundle import failed");
            if replacing_current {
                if let Err(reopen) = open_workspace(state, &workspace_path) {
                    tracing::error!(
                        workspace = %workspace_path.display(),
                        error = ?reopen,
                        "workspace reopen after failed import failed"
                    );
                }
            }
            return err(
                &req.id,
                "backup_failed",
                e.to_string(),
                Some(json!({ "path": src.to_string_lossy() })),
            );
        }
    };

    match open_workspace(state, &workspace_path) {
        Ok(()) => ok(
            &req.id,
            json!({
                "workspacePath": workspace_path.to_string_lossy(),
                "bundleFormatDetected": import.bundle_format_detected
            }),
        ),
        Err(e) => err(&req.id, "db_open_failed", format!("{e:?}"), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "backup.exportWorkspaceBundle" => Some(handle_backup_export_workspace_bundle(state, req)),
        "backup.importWorkspaceBundle" => Some(handle_backup_import_workspace_bundle(state, req)),
        _ => None,
    }
}
