use crate::ipc::error::err;
use crate::ipc::types::Request;
use serde_json::Value;
use std::str::FromStr;

/// Param extraction failures are returned as ready-to-send error responses.
pub type ParamResult<T> = Result<T, Value>;

pub fn required_str<'a>(req: &'a Request, key: &str) -> ParamResult<&'a str> {
    match req.params.get(key) {
        Some(Value::String(s)) => Ok(s.as_str()),
        Some(_) => Err(err(
            &req.id,
            "bad_params",
            format!("{key} must be a string"),
            None,
        )),
        None => Err(err(&req.id, "bad_params", format!("missing {key}"), None)),
    }
}

/// Absent and null are both "not provided".
pub fn optional_str<'a>(req: &'a Request, key: &str) -> ParamResult<Option<&'a str>> {
    match req.params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(_) => Err(err(
            &req.id,
            "bad_params",
            format!("{key} must be a string or null"),
            None,
        )),
    }
}

pub fn required_id<T: FromStr>(req: &Request, key: &str) -> ParamResult<T> {
    let raw = required_str(req, key)?;
    raw.parse::<T>().map_err(|_| {
        err(
            &req.id,
            "bad_params",
            format!("{key} is not a valid id"),
            Some(serde_json::json!({ "param": key, "value": raw })),
        )
    })
}

/// Numeric form fields arrive either as JSON numbers or as the raw text the
/// user typed. Both are handed on as text so the domain parser sees one shape.
pub fn numeric_text(req: &Request, key: &str) -> ParamResult<Option<String>> {
    match req.params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(_) => Err(err(
            &req.id,
            "bad_params",
            format!("{key} must be a number or string"),
            None,
        )),
    }
}

/// Collapses a handler result; both arms are already full responses.
pub fn reply(result: ParamResult<Value>) -> Value {
    result.unwrap_or_else(|resp| resp)
}
