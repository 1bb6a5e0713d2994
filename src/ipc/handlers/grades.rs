use crate::error::GradebookError;
use crate::ids::{AssignmentId, StudentId};
use crate::ipc::error::{domain_err, ok};
use crate::ipc::helpers::{numeric_text, reply, required_id, ParamResult};
use crate::ipc::types::{AppState, Request};
use crate::ledger;
use serde_json::json;
use tracing::debug;

/// Unparseable scores are answered with `accepted: false` rather than an
/// error: the entry is dropped and the ledger is untouched.
fn handle_grades_submit(state: &mut AppState, req: &Request) -> ParamResult<serde_json::Value> {
    let student_id: StudentId = required_id(req, "studentId")?;
    let assignment_id: AssignmentId = required_id(req, "assignmentId")?;
    let raw = numeric_text(req, "score")?.unwrap_or_default();

    match ledger::submit_grade(&mut *state.store, student_id, assignment_id, &raw) {
        Ok(grade) => Ok(ok(&req.id, json!({ "accepted": true, "grade": grade }))),
        Err(GradebookError::InvalidInput(reason)) => {
            debug!(request_id = %req.id, %reason, "grade submission ignored");
            Ok(ok(&req.id, json!({ "accepted": false, "reason": reason })))
        }
        Err(e) => Err(domain_err(&req.id, e)),
    }
}

fn handle_grades_get(state: &mut AppState, req: &Request) -> ParamResult<serde_json::Value> {
    let student_id: StudentId = required_id(req, "studentId")?;
    let assignment_id: AssignmentId = required_id(req, "assignmentId")?;
    let lookup = ledger::grade_for(&*state.store, student_id, assignment_id)
        .map_err(|e| domain_err(&req.id, e))?;
    Ok(ok(
        &req.id,
        json!({ "grade": lookup, "score": lookup.score() }),
    ))
}

fn handle_grades_clear(state: &mut AppState, req: &Request) -> ParamResult<serde_json::Value> {
    let student_id: StudentId = required_id(req, "studentId")?;
    let assignment_id: AssignmentId = required_id(req, "assignmentId")?;
    let cleared = ledger::clear_grade(&mut *state.store, student_id, assignment_id)
        .map_err(|e| domain_err(&req.id, e))?;
    Ok(ok(&req.id, json!({ "cleared": cleared })))
}

fn handle_grades_list_for_student(
    state: &mut AppState,
    req: &Request,
) -> ParamResult<serde_json::Value> {
    let student_id: StudentId = required_id(req, "studentId")?;
    let grades = ledger::grades_for_student(&*state.store, student_id)
        .map_err(|e| domain_err(&req.id, e))?;
    Ok(ok(&req.id, json!({ "grades": grades })))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "grades.submit" => handle_grades_submit(state, req),
        "grades.get" => handle_grades_get(state, req),
        "grades.clear" => handle_grades_clear(state, req),
        "grades.listForStudent" => handle_grades_list_for_student(state, req),
        _ => return None,
    };
    Some(reply(result))
}
