use rusqlite::Connection;
use serde::de::DeserializeOwned;

use crate::ipc::error::err;
use crate::ipc::types::{AppState, Request};
use crate::records::ValidationPolicy;

pub fn required_str(req: &Request, key: &str) -> Result<String, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.to_string())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))
}

pub fn optional_str(req: &Request, key: &str) -> Option<String> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.to_string())
}

pub fn required_f64(req: &Request, key: &str) -> Result<f64, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_f64())
        .ok_or_else(|| err(&req.id, "bad_params", format!("{} must be a number", key), None))
}

/// Missing and `null` both read as absent; anything else must be a number.
pub fn optional_f64(req: &Request, key: &str) -> Result<Option<f64>, serde_json::Value> {
    match req.params.get(key) {
        None => Ok(None),
        Some(v) if v.is_null() => Ok(None),
        Some(v) => v.as_f64().map(Some).ok_or_else(|| {
            err(
                &req.id,
                "bad_params",
                format!("{} must be a number or null", key),
                None,
            )
        }),
    }
}

pub fn required_param<T: DeserializeOwned>(req: &Request, key: &str) -> Result<T, serde_json::Value> {
    let Some(raw) = req.params.get(key) else {
        return Err(err(&req.id, "bad_params", format!("missing {}", key), None));
    };
    serde_json::from_value(raw.clone())
        .map_err(|e| err(&req.id, "bad_params", format!("invalid {}: {}", key, e), None))
}

pub fn optional_param<T: DeserializeOwned + Default>(
    req: &Request,
    key: &str,
) -> Result<T, serde_json::Value> {
    match req.params.get(key) {
        None => Ok(T::default()),
        Some(v) if v.is_null() => Ok(T::default()),
        Some(_) => required_param(req, key),
    }
}

pub fn parse_params<T: DeserializeOwned>(req: &Request) -> Result<T, serde_json::Value> {
    serde_json::from_value(req.params.clone())
        .map_err(|e| err(&req.id, "bad_params", format!("invalid params: {}", e), None))
}

/// `params.validation` overrides the workspace setting for one request.
pub fn validation_policy(state: &AppState, req: &Request) -> Result<ValidationPolicy, serde_json::Value> {
    match req.params.get("validation") {
        None => Ok(state.settings.validation),
        Some(v) if v.is_null() => Ok(state.settings.validation),
        Some(v) => v.as_str().and_then(ValidationPolicy::parse).ok_or_else(|| {
            err(
                &req.id,
                "bad_params",
                "validation must be one of: strict, lenient",
                Some(v.clone()),
            )
        }),
    }
}

pub fn db_conn<'a>(state: &'a AppState, req: &Request) -> Result<&'a Connection, serde_json::Value> {
    state
        .db
        .as_ref()
        .ok_or_else(|| err(&req.id, "no_workspace", "select a workspace first", None))
}
