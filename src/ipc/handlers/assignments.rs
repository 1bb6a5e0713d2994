use crate::ids::AssignmentId;
use crate::ipc::error::{domain_err, err, ok};
use crate::ipc::helpers::{numeric_text, optional_str, reply, required_id, required_str, ParamResult};
use crate::ipc::types::{AppState, Request};
use crate::records;
use serde_json::json;

fn handle_assignments_list(state: &mut AppState, req: &Request) -> ParamResult<serde_json::Value> {
    let assignments = state
        .store
        .assignments()
        .map_err(|e| domain_err(&req.id, e))?;
    Ok(ok(&req.id, json!({ "assignments": assignments })))
}

fn handle_assignments_create(
    state: &mut AppState,
    req: &Request,
) -> ParamResult<serde_json::Value> {
    let name = required_str(req, "name")?;
    let Some(point_value) = numeric_text(req, "pointValue")? else {
        return Err(err(&req.id, "bad_params", "missing pointValue", None));
    };
    let assignment = records::create_assignment(&mut *state.store, name, &point_value)
        .map_err(|e| domain_err(&req.id, e))?;
    Ok(ok(&req.id, json!({ "assignment": assignment })))
}

fn handle_assignments_update(
    state: &mut AppState,
    req: &Request,
) -> ParamResult<serde_json::Value> {
    let assignment_id: AssignmentId = required_id(req, "assignmentId")?;
    let name = optional_str(req, "name")?;
    let point_value = numeric_text(req, "pointValue")?;
    let assignment = records::update_assignment(
        &mut *state.store,
        assignment_id,
        name,
        point_value.as_deref(),
    )
    .map_err(|e| domain_err(&req.id, e))?;
    Ok(ok(&req.id, json!({ "assignment": assignment })))
}

fn handle_assignments_delete(
    state: &mut AppState,
    req: &Request,
) -> ParamResult<serde_json::Value> {
    let assignment_id: AssignmentId = required_id(req, "assignmentId")?;
    records::delete_assignment(&mut *state.store, assignment_id)
        .map_err(|e| domain_err(&req.id, e))?;
    Ok(ok(&req.id, json!({ "deleted": true })))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "assignments.list" => handle_assignments_list(state, req),
        "assignments.create" => handle_assignments_create(state, req),
        "assignments.update" => handle_assignments_update(state, req),
        "assignments.delete" => handle_assignments_delete(state, req),
        _ => return None,
    };
    Some(reply(result))
}
