use crate::calc::Category;
use crate::ipc::error::{grade_err, ok};
use crate::ipc::helpers::{optional_str, required_f64, required_param, validation_policy};
use crate::ipc::types::{AppState, Request};
use crate::records::{self, CategoryRecord, WEIGHT_EPSILON};
use serde_json::json;

fn parse_categories(state: &AppState, req: &Request) -> Result<Vec<Category>, serde_json::Value> {
    let policy = validation_policy(state, req)?;
    let rows: Vec<CategoryRecord> = required_param(req, "categories")?;
    rows.into_iter()
        .map(|c| c.into_category(policy))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| grade_err(&req.id, &e))
}

fn handle_weights(state: &mut AppState, req: &Request) -> serde_json::Value {
    let categories = match parse_categories(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let exclude = optional_str(req, "excludeId");
    let total = records::weights_total(&categories, exclude.as_deref());
    ok(
        &req.id,
        json!({
            "total": total,
            "available": 100.0 - total,
            "complete": (total - 100.0).abs() <= WEIGHT_EPSILON,
        }),
    )
}

fn handle_check_weight(state: &mut AppState, req: &Request) -> serde_json::Value {
    let categories = match parse_categories(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let percentage = match required_f64(req, "percentage") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let editing = optional_str(req, "editingId");
    match records::check_weight_change(&categories, percentage, editing.as_deref()) {
        Ok(new_total) => ok(
            &req.id,
            json!({
                "newTotal": new_total,
                "available": records::available_percentage(&categories, editing.as_deref()),
            }),
        ),
        Err(e) => grade_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "categories.weights" => Some(handle_weights(state, req)),
        "categories.checkWeight" => Some(handle_check_weight(state, req)),
        _ => None,
    }
}
