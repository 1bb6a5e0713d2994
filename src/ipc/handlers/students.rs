use crate::ids::StudentId;
use crate::ipc::error::{domain_err, ok};
use crate::ipc::helpers::{optional_str, reply, required_id, required_str, ParamResult};
use crate::ipc::types::{AppState, Request};
use crate::records;
use serde_json::json;

fn handle_students_list(state: &mut AppState, req: &Request) -> ParamResult<serde_json::Value> {
    let students = state
        .store
        .students()
        .map_err(|e| domain_err(&req.id, e))?;
    Ok(ok(&req.id, json!({ "students": students })))
}

fn handle_students_create(state: &mut AppState, req: &Request) -> ParamResult<serde_json::Value> {
    let full_name = required_str(req, "fullName")?;
    let email = required_str(req, "email")?;
    let student = records::create_student(&mut *state.store, full_name, email)
        .map_err(|e| domain_err(&req.id, e))?;
    Ok(ok(&req.id, json!({ "student": student })))
}

fn handle_students_update(state: &mut AppState, req: &Request) -> ParamResult<serde_json::Value> {
    let student_id: StudentId = required_id(req, "studentId")?;
    let full_name = optional_str(req, "fullName")?;
    let email = optional_str(req, "email")?;
    let student = records::update_student(&mut *state.store, student_id, full_name, email)
        .map_err(|e| domain_err(&req.id, e))?;
    Ok(ok(&req.id, json!({ "student": student })))
}

fn handle_students_delete(state: &mut AppState, req: &Request) -> ParamResult<serde_json::Value> {
    let student_id: StudentId = required_id(req, "studentId")?;
    records::delete_student(&mut *state.store, student_id)
        .map_err(|e| domain_err(&req.id, e))?;
    Ok(ok(&req.id, json!({ "deleted": true })))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "students.list" => handle_students_list(state, req),
        "students.create" => handle_students_create(state, req),
        "students.update" => handle_students_update(state, req),
        "students.delete" => handle_students_delete(state, req),
        _ => return None,
    };
    Some(reply(result))
}
