mod test_support;

use serde_json::json;
use test_support::{request_ok, spawn_sidecar, str_field, temp_dir};

#[test]
fn save_creates_then_updates_in_place() {
    let workspace = temp_dir("scanmark-upsert");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    // No id: the sidecar assigns one.
    let created = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "answerKeys.save",
        json!({ "answerKey": { "name": "Unit 1", "definition": { "questions": 20, "choices": "ABCD" } } }),
    );
    let key_id = str_field(&created, "/answerKey/id").to_string();
    assert!(!key_id.is_empty());
    let created_at = str_field(&created, "/answerKey/createdAt").to_string();
    assert!(created_at.ends_with('Z'));
    assert_eq!(created["answerKey"]["definition"]["questions"], json!(20));

    std::thread::sleep(std::time::Duration::from_millis(5));

    let updated = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "answerKeys.save",
        json!({ "answerKey": {
            "id": key_id,
            "name": "Unit 1 (revised)",
            "definition": { "questions": 25 },
            "createdAt": "1999-01-01T00:00:00.000Z"
        } }),
    );
    assert_eq!(str_field(&updated, "/answerKey/name"), "Unit 1 (revised)");
    assert_eq!(str_field(&updated, "/answerKey/createdAt"), created_at);
    assert!(str_field(&updated, "/answerKey/updatedAt") > created_at.as_str());

    let listed = request_ok(&mut stdin, &mut reader, "4", "answerKeys.list", json!({}));
    assert_eq!(listed["answerKeys"].as_array().map(|a| a.len()), Some(1));

    let deleted = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "answerKeys.delete",
        json!({ "answerKeyId": key_id }),
    );
    assert_eq!(deleted["deleted"], json!(true));

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn lists_keep_insertion_order_and_filter() {
    let workspace = temp_dir("scanmark-order");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    for (id, name) in [("c2", "Zoology"), ("c1", "Algebra")] {
        let _ = request_ok(
            &mut stdin,
            &mut reader,
            id,
            "classes.save",
            json!({ "class": { "id": id, "name": name } }),
        );
    }
    for (id, class_id) in [("s1", "c1"), ("s2", "c2"), ("s3", "c1")] {
        let _ = request_ok(
            &mut stdin,
            &mut reader,
            id,
            "students.save",
            json!({ "student": { "id": id, "name": id, "studentId": id, "classId": class_id } }),
        );
    }

    let classes = request_ok(&mut stdin, &mut reader, "2", "classes.list", json!({}));
    let names: Vec<&str> = classes["classes"]
        .as_array()
        .expect("classes")
        .iter()
        .filter_map(|c| c["name"].as_str())
        .collect();
    assert_eq!(names, vec!["Zoology", "Algebra"]);

    let in_c1 = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "students.list",
        json!({ "classId": "c1" }),
    );
    let rows = in_c1["students"].as_array().expect("students");
    let ids: Vec<&str> = rows.iter().filter_map(|s| s["id"].as_str()).collect();
    assert_eq!(ids, vec!["s1", "s3"]);
    assert_eq!(rows[0]["className"], json!("Algebra"));

    // Updating a student does not move it to the end.
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "students.save",
        json!({ "student": { "id": "s1", "name": "Renamed", "studentId": "s1", "classId": "c1" } }),
    );
    let all = request_ok(&mut stdin, &mut reader, "5", "students.list", json!({}));
    let ids: Vec<&str> = all["students"]
        .as_array()
        .expect("students")
        .iter()
        .filter_map(|s| s["id"].as_str())
        .collect();
    assert_eq!(ids, vec!["s1", "s2", "s3"]);

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}
