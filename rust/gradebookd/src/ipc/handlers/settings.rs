use crate::ipc::error::{err, ok};
use crate::ipc::helpers::db_conn;
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_settings_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "settings": state.settings,
            "persisted": state.db.is_some(),
        }),
    )
}

fn handle_settings_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let mut next = state.settings;
    if let Err(message) = next.apply_patch(&req.params) {
        return err(&req.id, "bad_params", message, None);
    }

    // Without a workspace the change only lives for this process.
    if state.db.is_some() {
        let conn = match db_conn(state, req) {
            Ok(c) => c,
            Err(e) => return e,
        };
        if let Err(e) = next.save(conn) {
            return err(&req.id, "db_update_failed", e.to_string(), None);
        }
    }
    state.settings = next;
    ok(
        &req.id,
        json!({
            "settings": state.settings,
            "persisted": state.db.is_some(),
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "settings.get" => Some(handle_settings_get(state, req)),
        "settings.update" => Some(handle_settings_update(state, req)),
        _ => None,
    }
}
