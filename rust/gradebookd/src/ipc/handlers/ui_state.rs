use crate::ipc::error::{err, ok};
use crate::ipc::helpers::required_str;
use crate::ipc::types::{AppState, Request};
use crate::ui_state::UiStateKey;
use serde_json::json;

fn state_key(req: &Request) -> Result<UiStateKey, serde_json::Value> {
    let key = required_str(req, "key")?;
    if key == crate::ui_state::EXPANDED_CATEGORIES_KEY {
        return Ok(UiStateKey::ExpandedCategories);
    }
    Ok(UiStateKey::State(key))
}

fn form_key(req: &Request) -> Result<UiStateKey, serde_json::Value> {
    Ok(UiStateKey::FormDraft {
        kind: required_str(req, "kind")?,
        key: required_str(req, "key")?,
    })
}

fn store_failed(req: &Request, e: anyhow::Error) -> serde_json::Value {
    err(&req.id, "db_query_failed", e.to_string(), None)
}

fn handle_get(
    state: &mut AppState,
    req: &Request,
    key: UiStateKey,
    fallback: serde_json::Value,
) -> serde_json::Value {
    let default = req.params.get("default").cloned().unwrap_or(fallback);
    match state.ui_state.get_or(&key, default) {
        Ok(value) => ok(&req.id, json!({ "value": value })),
        Err(e) => store_failed(req, e),
    }
}

fn handle_set(state: &mut AppState, req: &Request, key: UiStateKey) -> serde_json::Value {
    let value = req.params.get("value").cloned().unwrap_or(json!(null));
    match state.ui_state.set(&key, &value) {
        Ok(()) => ok(&req.id, json!({ "stored": !value.is_null() })),
        Err(e) => store_failed(req, e),
    }
}

fn handle_remove(state: &mut AppState, req: &Request, key: UiStateKey) -> serde_json::Value {
    match state.ui_state.remove(&key) {
        Ok(removed) => ok(&req.id, json!({ "removed": removed })),
        Err(e) => store_failed(req, e),
    }
}

fn handle_has(state: &mut AppState, req: &Request, key: UiStateKey) -> serde_json::Value {
    match state.ui_state.contains(&key) {
        Ok(present) => ok(&req.id, json!({ "present": present })),
        Err(e) => store_failed(req, e),
    }
}

#[derive(Clone, Copy)]
enum Op {
    Get,
    Set,
    Remove,
    Has,
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let (op, key) = match req.method.as_str() {
        "uiState.get" => (Op::Get, state_key(req)),
        "uiState.set" => (Op::Set, state_key(req)),
        "uiState.remove" => (Op::Remove, state_key(req)),
        "uiState.has" => (Op::Has, state_key(req)),
        "forms.get" => (Op::Get, form_key(req)),
        "forms.save" => (Op::Set, form_key(req)),
        "forms.clear" => (Op::Remove, form_key(req)),
        "forms.has" => (Op::Has, form_key(req)),
        _ => return None,
    };
    let key = match key {
        Ok(k) => k,
        Err(e) => return Some(e),
    };
    // Form drafts read back as an empty object when nothing was saved.
    let fallback = match key {
        UiStateKey::FormDraft { .. } => json!({}),
        _ => json!(null),
    };
    let resp = match op {
        Op::Get => handle_get(state, req, key, fallback),
        Op::Set => handle_set(state, req, key),
        Op::Remove => handle_remove(state, req, key),
        Op::Has => handle_has(state, req, key),
    };
    Some(resp)
}
