use crate::ids::CourseId;
use crate::ipc::error::{domain_err, ok};
use crate::ipc::helpers::{reply, required_id, required_str, ParamResult};
use crate::ipc::types::{AppState, Request};
use crate::records;
use serde_json::json;

fn handle_courses_list(state: &mut AppState, req: &Request) -> ParamResult<serde_json::Value> {
    let store = &*state.store;
    let listed = store
        .courses()
        .and_then(|c| Ok((c, store.students()?, store.assignments()?)));
    let (courses, students, assignments) = listed.map_err(|e| domain_err(&req.id, e))?;

    // Counts let the UI show a dashboard without a second round trip.
    let rows: Vec<serde_json::Value> = courses
        .iter()
        .map(|c| {
            json!({
                "id": c.id,
                "name": c.name,
                "studentCount": students.iter().filter(|s| s.in_course(c.id)).count(),
                "assignmentCount": assignments.iter().filter(|a| a.in_course(c.id)).count(),
            })
        })
        .collect();
    Ok(ok(&req.id, json!({ "courses": rows })))
}

fn handle_courses_create(state: &mut AppState, req: &Request) -> ParamResult<serde_json::Value> {
    let name = required_str(req, "name")?;
    let course = records::create_course(&mut *state.store, name)
        .map_err(|e| domain_err(&req.id, e))?;
    Ok(ok(&req.id, json!({ "course": course })))
}

fn handle_courses_update(state: &mut AppState, req: &Request) -> ParamResult<serde_json::Value> {
    let course_id: CourseId = required_id(req, "courseId")?;
    let name = required_str(req, "name")?;
    let course = records::rename_course(&mut *state.store, course_id, name)
        .map_err(|e| domain_err(&req.id, e))?;
    Ok(ok(&req.id, json!({ "course": course })))
}

fn handle_courses_delete(state: &mut AppState, req: &Request) -> ParamResult<serde_json::Value> {
    let course_id: CourseId = required_id(req, "courseId")?;
    records::delete_course(&mut *state.store, course_id).map_err(|e| domain_err(&req.id, e))?;
    Ok(ok(&req.id, json!({ "deleted": true })))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "courses.list" => handle_courses_list(state, req),
        "courses.create" => handle_courses_create(state, req),
        "courses.update" => handle_courses_update(state, req),
        "courses.delete" => handle_courses_delete(state, req),
        _ => return None,
    };
    Some(reply(result))
}
