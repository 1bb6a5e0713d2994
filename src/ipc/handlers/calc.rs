use crate::calc;
use crate::ids::{CourseId, StudentId};
use crate::ipc::error::{domain_err, ok};
use crate::ipc::helpers::{reply, required_id, ParamResult};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_student_average(state: &mut AppState, req: &Request) -> ParamResult<serde_json::Value> {
    let course_id: CourseId = required_id(req, "courseId")?;
    let student_id: StudentId = required_id(req, "studentId")?;
    let average = calc::average_for_student(&*state.store, course_id, student_id)
        .map_err(|e| domain_err(&req.id, e))?;
    Ok(ok(&req.id, json!({ "average": average })))
}

fn handle_course_summary(state: &mut AppState, req: &Request) -> ParamResult<serde_json::Value> {
    let course_id: CourseId = required_id(req, "courseId")?;
    let summary =
        calc::course_summary(&*state.store, course_id).map_err(|e| domain_err(&req.id, e))?;
    Ok(ok(&req.id, json!(summary)))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "calc.studentAverage" => handle_student_average(state, req),
        "calc.courseSummary" => handle_course_summary(state, req),
        _ => return None,
    };
    Some(reply(result))
}
