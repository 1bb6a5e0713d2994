use crate::error::GradebookError;
use serde_json::json;
use tracing::warn;

pub fn ok(id: &str, result: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(
    id: &str,
    code: &str,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(d) = details {
        error["details"] = d;
    }
    json!({
        "id": id,
        "ok": false,
        "error": error,
    })
}

/// Maps a domain failure onto the wire error shape.
pub fn domain_err(id: &str, e: GradebookError) -> serde_json::Value {
    let details = match &e {
        GradebookError::NotFound { entity, id } => Some(json!({ "entity": entity, "id": id })),
        _ => None,
    };
    if matches!(e, GradebookError::Storage(_)) {
        warn!(request_id = id, error = %e, "storage failure");
    }
    err(id, e.code(), e.to_string(), details)
}
