use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn spawn_sidecar(workspace: Option<&PathBuf>) -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_gradebookd");
    let mut cmd = Command::new(exe);
    cmd.env_remove("GRADEBOOKD_CONFIG")
        .env_remove("GRADEBOOKD_WORKSPACE")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null());
    if let Some(ws) = workspace {
        cmd.env("GRADEBOOKD_WORKSPACE", ws);
    }
    let mut child = cmd.spawn().expect("spawn gradebookd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({ "id": id, "method": method, "params": params });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    assert_eq!(
        value.get("ok").and_then(|v| v.as_bool()),
        Some(true),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or_default()
}

fn id_at(value: &serde_json::Value, pointer: &str) -> String {
    value
        .pointer(pointer)
        .and_then(|v| v.as_str())
        .unwrap_or_else(|| panic!("missing {} in {}", pointer, value))
        .to_string()
}

fn grade_count(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    student_id: &str,
) -> usize {
    let listed = request_ok(
        stdin,
        reader,
        id,
        "grades.listForStudent",
        json!({ "studentId": student_id }),
    );
    listed
        .get("grades")
        .and_then(|v| v.as_array())
        .map(|a| a.len())
        .unwrap_or(0)
}

#[test]
fn records_survive_a_daemon_restart() {
    let workspace = temp_dir("gradebook-persist");

    let (course_id, student_id, assignment_id) = {
        let (mut child, mut stdin, mut reader) = spawn_sidecar(None);
        let _ = request_ok(
            &mut stdin,
            &mut reader,
            "1",
            "workspace.select",
            json!({ "path": workspace.to_string_lossy() }),
        );
        let course = request_ok(
            &mut stdin,
            &mut reader,
            "2",
            "courses.create",
            json!({ "name": "Chemistry" }),
        );
        let course_id = id_at(&course, "/course/id");
        let student = request_ok(
            &mut stdin,
            &mut reader,
            "3",
            "students.create",
            json!({ "fullName": "Bo Reyes", "email": "bo@example.com" }),
        );
        let student_id = id_at(&student, "/student/id");
        let assignment = request_ok(
            &mut stdin,
            &mut reader,
            "4",
            "assignments.create",
            json!({ "name": "Lab 1", "pointValue": 50 }),
        );
        let assignment_id = id_at(&assignment, "/assignment/id");
        let _ = request_ok(
            &mut stdin,
            &mut reader,
            "5",
            "courses.students.add",
            json!({ "courseId": course_id, "studentId": student_id }),
        );
        let _ = request_ok(
            &mut stdin,
            &mut reader,
            "6",
            "courses.assignments.add",
            json!({ "courseId": course_id, "assignmentId": assignment_id }),
        );
        let _ = request_ok(
            &mut stdin,
            &mut reader,
            "7",
            "grades.submit",
            json!({ "studentId": student_id, "assignmentId": assignment_id, "score": 45 }),
        );
        drop(stdin);
        let _ = child.wait();
        (course_id, student_id, assignment_id)
    };

    // Second run opens the workspace from the environment.
    let (mut child, mut stdin, mut reader) = spawn_sidecar(Some(&workspace));
    let health = request_ok(&mut stdin, &mut reader, "10", "health", json!({}));
    assert_eq!(health.get("storage"), Some(&json!("sqlite")));

    let courses = request_ok(&mut stdin, &mut reader, "11", "courses.list", json!({}));
    let rows = courses.get("courses").and_then(|v| v.as_array()).expect("courses");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("name"), Some(&json!("Chemistry")));
    assert_eq!(rows[0].get("studentCount").and_then(|v| v.as_u64()), Some(1));
    assert_eq!(rows[0].get("assignmentCount").and_then(|v| v.as_u64()), Some(1));

    let lookup = request_ok(
        &mut stdin,
        &mut reader,
        "12",
        "grades.get",
        json!({ "studentId": student_id, "assignmentId": assignment_id }),
    );
    assert_eq!(lookup.get("score").and_then(|v| v.as_f64()), Some(45.0));

    let avg = request_ok(
        &mut stdin,
        &mut reader,
        "13",
        "calc.studentAverage",
        json!({ "courseId": course_id, "studentId": student_id }),
    );
    assert_eq!(avg.pointer("/average/percent").and_then(|v| v.as_f64()), Some(90.0));

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn deleting_a_course_keeps_grades_but_deleting_a_student_drops_them() {
    let workspace = temp_dir("gradebook-delete");
    let (mut child, mut stdin, mut reader) = spawn_sidecar(Some(&workspace));

    let course = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "courses.create",
        json!({ "name": "Biology" }),
    );
    let course_id = id_at(&course, "/course/id");
    let student = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "students.create",
        json!({ "fullName": "Cy Ito", "email": "cy@example.com" }),
    );
    let student_id = id_at(&student, "/student/id");
    let assignment = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "assignments.create",
        json!({ "name": "Essay", "pointValue": "25" }),
    );
    let assignment_id = id_at(&assignment, "/assignment/id");
    for (id, method, params) in [
        (
            "4",
            "courses.students.add",
            json!({ "courseId": course_id, "studentId": student_id }),
        ),
        (
            "5",
            "courses.assignments.add",
            json!({ "courseId": course_id, "assignmentId": assignment_id }),
        ),
        (
            "6",
            "grades.submit",
            json!({ "studentId": student_id, "assignmentId": assignment_id, "score": 20 }),
        ),
    ] {
        let _ = request_ok(&mut stdin, &mut reader, id, method, params);
    }

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "courses.delete",
        json!({ "courseId": course_id }),
    );
    let students = request_ok(&mut stdin, &mut reader, "8", "students.list", json!({}));
    assert_eq!(
        students.pointer("/students/0/courseIds"),
        Some(&json!([])),
        "course links should be gone"
    );
    assert_eq!(grade_count(&mut stdin, &mut reader, "9", &student_id), 1);

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "10",
        "students.delete",
        json!({ "studentId": student_id }),
    );
    assert_eq!(grade_count(&mut stdin, &mut reader, "11", &student_id), 0);

    let assignments = request_ok(&mut stdin, &mut reader, "12", "assignments.list", json!({}));
    assert_eq!(
        assignments
            .get("assignments")
            .and_then(|v| v.as_array())
            .map(|a| a.len()),
        Some(1)
    );

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn backup_bundle_restores_deleted_records() {
    let workspace = temp_dir("gradebook-restore");
    let bundle = workspace.join("backups").join("before.zip");
    let (mut child, mut stdin, mut reader) = spawn_sidecar(Some(&workspace));

    let course = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "courses.create",
        json!({ "name": "History" }),
    );
    let course_id = id_at(&course, "/course/id");

    let export = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "backup.exportWorkspaceBundle",
        json!({ "outPath": bundle.to_string_lossy() }),
    );
    assert_eq!(export.get("bundleFormat"), Some(&json!("gradebook-workspace-v1")));
    assert_eq!(export.get("entryCount").and_then(|v| v.as_u64()), Some(2));

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "courses.delete",
        json!({ "courseId": course_id }),
    );
    let courses = request_ok(&mut stdin, &mut reader, "4", "courses.list", json!({}));
    assert_eq!(courses.get("courses"), Some(&json!([])));

    let import = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "backup.importWorkspaceBundle",
        json!({ "inPath": bundle.to_string_lossy() }),
    );
    assert_eq!(
        import.get("bundleFormatDetected"),
        Some(&json!("gradebook-workspace-v1"))
    );
    let courses = request_ok(&mut stdin, &mut reader, "6", "courses.list", json!({}));
    assert_eq!(courses.pointer("/courses/0/id"), Some(&json!(course_id)));

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn importing_a_non_database_file_keeps_the_workspace() {
    let workspace = temp_dir("gradebook-bad-import");
    let junk = workspace.join("notes.txt");
    std::fs::write(&junk, "this is not a database").expect("write junk");
    let (mut child, mut stdin, mut reader) = spawn_sidecar(Some(&workspace));

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "courses.create",
        json!({ "name": "Precious" }),
    );

    let payload = json!({
        "id": "2",
        "method": "backup.importWorkspaceBundle",
        "params": { "inPath": junk.to_string_lossy() },
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");
    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("ok").and_then(|v| v.as_bool()), Some(false));
    assert_eq!(value.pointer("/error/code"), Some(&json!("backup_failed")));

    let health = request_ok(&mut stdin, &mut reader, "3", "health", json!({}));
    assert_eq!(health.get("storage"), Some(&json!("sqlite")));
    assert_eq!(
        health.get("workspacePath"),
        Some(&json!(workspace.to_string_lossy()))
    );
    let courses = request_ok(&mut stdin, &mut reader, "4", "courses.list", json!({}));
    assert_eq!(courses.pointer("/courses/0/name"), Some(&json!("Precious")));
    assert!(!workspace.join("gradebook.sqlite3.importing").exists());

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}
