use crate::associations;
use crate::ids::{AssignmentId, CourseId, StudentId};
use crate::ipc::error::{domain_err, ok};
use crate::ipc::helpers::{reply, required_id, ParamResult};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_students_add(state: &mut AppState, req: &Request) -> ParamResult<serde_json::Value> {
    let course_id: CourseId = required_id(req, "courseId")?;
    let student_id: StudentId = required_id(req, "studentId")?;
    let added = associations::associate_student(&mut *state.store, course_id, student_id)
        .map_err(|e| domain_err(&req.id, e))?;
    Ok(ok(&req.id, json!({ "added": added })))
}

fn handle_students_remove(state: &mut AppState, req: &Request) -> ParamResult<serde_json::Value> {
    let course_id: CourseId = required_id(req, "courseId")?;
    let student_id: StudentId = required_id(req, "studentId")?;
    let removed = associations::dissociate_student(&mut *state.store, course_id, student_id)
        .map_err(|e| domain_err(&req.id, e))?;
    Ok(ok(&req.id, json!({ "removed": removed })))
}

fn handle_students_list(state: &mut AppState, req: &Request) -> ParamResult<serde_json::Value> {
    let course_id: CourseId = required_id(req, "courseId")?;
    let students = associations::students_in_course(&*state.store, course_id)
        .map_err(|e| domain_err(&req.id, e))?;
    Ok(ok(&req.id, json!({ "students": students })))
}

fn handle_assignments_add(state: &mut AppState, req: &Request) -> ParamResult<serde_json::Value> {
    let course_id: CourseId = required_id(req, "courseId")?;
    let assignment_id: AssignmentId = required_id(req, "assignmentId")?;
    let added = associations::associate_assignment(&mut *state.store, course_id, assignment_id)
        .map_err(|e| domain_err(&req.id, e))?;
    Ok(ok(&req.id, json!({ "added": added })))
}

fn handle_assignments_remove(
    state: &mut AppState,
    req: &Request,
) -> ParamResult<serde_json::Value> {
    let course_id: CourseId = required_id(req, "courseId")?;
    let assignment_id: AssignmentId = required_id(req, "assignmentId")?;
    let removed =
        associations::dissociate_assignment(&mut *state.store, course_id, assignment_id)
            .map_err(|e| domain_err(&req.id, e))?;
    Ok(ok(&req.id, json!({ "removed": removed })))
}

fn handle_assignments_list(state: &mut AppState, req: &Request) -> ParamResult<serde_json::Value> {
    let course_id: CourseId = required_id(req, "courseId")?;
    let assignments = associations::assignments_in_course(&*state.store, course_id)
        .map_err(|e| domain_err(&req.id, e))?;
    Ok(ok(&req.id, json!({ "assignments": assignments })))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "courses.students.add" => handle_students_add(state, req),
        "courses.students.remove" => handle_students_remove(state, req),
        "courses.students.list" => handle_students_list(state, req),
        "courses.assignments.add" => handle_assignments_add(state, req),
        "courses.assignments.remove" => handle_assignments_remove(state, req),
        "courses.assignments.list" => handle_assignments_list(state, req),
        _ => return None,
    };
    Some(reply(result))
}
