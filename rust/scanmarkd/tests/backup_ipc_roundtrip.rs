mod test_support;

use serde_json::json;
use test_support::{error_code, request_err, request_ok, spawn_sidecar, str_field, temp_dir};

#[test]
fn bundle_export_and_import_through_sidecar() {
    let src = temp_dir("scanmark-bundle-src");
    let dst = temp_dir("scanmark-bundle-dst");
    let out_dir = temp_dir("scanmark-bundle-out");
    let bundle = out_dir.join("class-backup.zip");

    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": src.to_string_lossy() }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "classes.save",
        json!({ "class": { "id": "c1", "name": "Chemistry" } }),
    );
    let exported = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "backup.exportWorkspaceBundle",
        json!({ "outPath": bundle.to_string_lossy() }),
    );
    assert_eq!(exported["bundleFormat"], json!("scanmark-workspace-v1"));
    assert_eq!(exported["entryCount"], json!(2));
    assert_eq!(str_field(&exported, "/dbSha256").len(), 64);
    assert!(bundle.is_file());

    let imported = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "backup.importWorkspaceBundle",
        json!({ "inPath": bundle.to_string_lossy(), "workspacePath": dst.to_string_lossy() }),
    );
    assert_eq!(imported["bundleFormatDetected"], json!("scanmark-workspace-v1"));

    // Import switches the sidecar to the restored workspace.
    let got = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "classes.get",
        json!({ "classId": "c1" }),
    );
    assert_eq!(got["class"]["name"], json!("Chemistry"));
    let health = request_ok(&mut stdin, &mut reader, "6", "health", json!({}));
    assert_eq!(health["workspacePath"], json!(dst.to_string_lossy()));

    let e = request_err(
        &mut stdin,
        &mut reader,
        "7",
        "backup.importWorkspaceBundle",
        json!({ "inPath": out_dir.join("missing.zip").to_string_lossy() }),
    );
    assert_eq!(error_code(&e), "not_found");

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(src);
    let _ = std::fs::remove_dir_all(dst);
    let _ = std::fs::remove_dir_all(out_dir);
}

#[test]
fn importing_a_non_database_keeps_the_current_workspace() {
    let workspace = temp_dir("scanmark-bundle-junk");
    let src_dir = temp_dir("scanmark-bundle-junk-src");
    let notes = src_dir.join("notes.txt");
    std::fs::write(&notes, b"this is not a database at all").expect("write notes");

    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "classes.save",
        json!({ "class": { "id": "c1", "name": "Physics" } }),
    );

    let e = request_err(
        &mut stdin,
        &mut reader,
        "3",
        "backup.importWorkspaceBundle",
        json!({ "inPath": notes.to_string_lossy() }),
    );
    assert_eq!(error_code(&e), "backup_failed");

    let got = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "classes.get",
        json!({ "classId": "c1" }),
    );
    assert_eq!(got["class"]["name"], json!("Physics"));

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let listed = request_ok(&mut stdin, &mut reader, "6", "classes.list", json!({}));
    assert_eq!(listed["classes"].as_array().map(|a| a.len()), Some(1));

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
    let _ = std::fs::remove_dir_all(src_dir);
}
