mod test_support;

use serde_json::json;
use test_support::{request_err, request_ok, spawn_sidecar};

fn worked_example_categories() -> serde_json::Value {
    json!([
        { "id": "a", "name": "Exams", "percentage": 60, "calculation_mode": "dynamic" },
        { "id": "b", "name": "Labs", "percentage": 40, "calculation_mode": "fixed", "total_activities": 2 }
    ])
}

#[test]
fn subject_grade_reports_grade_letter_and_completion() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let r = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "grades.subject",
        json!({
            "categories": worked_example_categories(),
            "activitiesByCategory": {
                "a": [{ "max_score": 100, "obtained_score": 80, "is_pending": false }],
                "b": [
                    { "max_score": 100, "obtained_score": 100, "is_pending": false },
                    { "max_score": 100, "obtained_score": null, "is_pending": true }
                ]
            }
        }),
    );
    assert_eq!(r.get("grade").and_then(|v| v.as_f64()), Some(68.0));
    assert_eq!(r.get("letter").and_then(|v| v.as_str()), Some("D"));
    assert_eq!(r.get("status").and_then(|v| v.as_str()), Some("Passed with warning"));
    assert_eq!(r.get("percentComplete").and_then(|v| v.as_i64()), Some(80));
    assert_eq!(r.get("statusClass").and_then(|v| v.as_str()), Some("warning"));
    assert_eq!(r.get("minPassingGrade").and_then(|v| v.as_f64()), Some(61.0));
    assert_eq!(r.get("meetsMinimum").and_then(|v| v.as_bool()), Some(true));
    assert_eq!(r.get("validation").and_then(|v| v.as_str()), Some("strict"));

    let cats = r.get("categories").and_then(|v| v.as_array()).expect("categories");
    assert_eq!(cats.len(), 2);
    assert_eq!(cats[1].get("name").and_then(|v| v.as_str()), Some("Labs"));
    assert_eq!(cats[1].get("pending").and_then(|v| v.as_u64()), Some(1));
    assert_eq!(cats[1].get("activityWeight").and_then(|v| v.as_f64()), Some(20.0));
    assert!(cats[0].get("activityWeight").is_none());
}

#[test]
fn flat_activity_listing_is_grouped_by_category_id() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let r = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "grades.subject",
        json!({
            "categories": worked_example_categories(),
            "activities": [
                { "category_id": "a", "max_score": 100, "obtained_score": 80 },
                { "category_id": "b", "max_score": 100, "obtained_score": 100 }
            ]
        }),
    );
    assert_eq!(r.get("grade").and_then(|v| v.as_f64()), Some(68.0));
    assert_eq!(r.get("percentComplete").and_then(|v| v.as_i64()), Some(80));
}

#[test]
fn strict_validation_surfaces_typed_errors() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let (code, error) = request_err(
        &mut stdin,
        &mut reader,
        "1",
        "grades.subject",
        json!({
            "categories": worked_example_categories(),
            "activitiesByCategory": {
                "a": [{ "max_score": 10, "obtained_score": 12 }]
            }
        }),
    );
    assert_eq!(code, "invalid_score");
    assert_eq!(error.pointer("/details/maxScore").and_then(|v| v.as_f64()), Some(10.0));

    let (code, _) = request_err(
        &mut stdin,
        &mut reader,
        "2",
        "grades.subject",
        json!({
            "categories": [{ "id": "a", "percentage": 60, "calculation_mode": "curved" }]
        }),
    );
    assert_eq!(code, "invalid_calculation_mode");

    let r = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "grades.subject",
        json!({
            "categories": [{ "id": "a", "percentage": 60, "calculation_mode": "dynamic" }]
        }),
    );
    assert_eq!(
        r.pointer("/weightError/code").and_then(|v| v.as_str()),
        Some("invalid_category_weights")
    );
    assert_eq!(
        r.pointer("/weightError/details/available").and_then(|v| v.as_f64()),
        Some(40.0)
    );

    let (code, _) = request_err(
        &mut stdin,
        &mut reader,
        "4",
        "grades.subject",
        json!({
            "categories": [{ "id": "a", "percentage": 100, "calculation_mode": "fixed" }]
        }),
    );
    assert_eq!(code, "invalid_total_activities");
}

#[test]
fn lenient_validation_per_request_and_via_settings() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let params = json!({
        "categories": [{ "id": "a", "percentage": 60, "calculation_mode": "dynamic" }],
        "activitiesByCategory": { "a": [{ "max_score": 10, "obtained_score": 12 }] }
    });

    let mut lenient = params.clone();
    lenient["validation"] = json!("lenient");
    let r = request_ok(&mut stdin, &mut reader, "1", "grades.subject", lenient);
    assert_eq!(r.get("grade").and_then(|v| v.as_f64()), Some(72.0));
    assert_eq!(r.get("letter").and_then(|v| v.as_str()), Some("C"));
    assert_eq!(r.get("percentComplete").and_then(|v| v.as_i64()), Some(60));

    let (code, _) = request_err(&mut stdin, &mut reader, "2", "grades.subject", params.clone());
    assert_eq!(code, "invalid_score");

    let s = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "settings.update",
        json!({ "validation": "lenient" }),
    );
    assert_eq!(s.get("persisted").and_then(|v| v.as_bool()), Some(false));
    let r = request_ok(&mut stdin, &mut reader, "4", "grades.subject", params);
    assert_eq!(r.get("validation").and_then(|v| v.as_str()), Some("lenient"));

    let (code, _) = request_err(
        &mut stdin,
        &mut reader,
        "5",
        "settings.update",
        json!({ "validation": "sloppy" }),
    );
    assert_eq!(code, "bad_params");
}

#[test]
fn category_contribution_flags_over_recorded_fixed_category() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let r = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "grades.categoryContribution",
        json!({
            "category": { "id": "q", "percentage": 20, "calculation_mode": "fixed", "total_activities": 1 },
            "activities": [
                { "max_score": 100, "obtained_score": 100 },
                { "max_score": 100, "obtained_score": 100 }
            ]
        }),
    );
    assert_eq!(r.get("contribution").and_then(|v| v.as_f64()), Some(40.0));
    assert_eq!(
        r.pointer("/breakdown/overRecorded").and_then(|v| v.as_bool()),
        Some(true)
    );
}

#[test]
fn semester_overview_lists_each_subject() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let r = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "grades.semester",
        json!({
            "subjects": [
                {
                    "id": "math",
                    "name": "Math",
                    "minPassingGrade": 70,
                    "categories": worked_example_categories(),
                    "activitiesByCategory": {
                        "a": [{ "max_score": 100, "obtained_score": 80 }],
                        "b": [{ "max_score": 100, "obtained_score": 100 }]
                    }
                },
                { "id": "art", "name": "Art", "categories": [] }
            ]
        }),
    );
    let rows = r.get("rows").and_then(|v| v.as_array()).expect("rows");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].get("display").and_then(|v| v.as_str()), Some("68.0"));
    assert_eq!(rows[0].get("meetsMinimum").and_then(|v| v.as_bool()), Some(false));
    assert_eq!(rows[1].get("letter").and_then(|v| v.as_str()), Some("N/A"));
    assert_eq!(rows[1].get("display").and_then(|v| v.as_str()), Some("--"));
    assert_eq!(rows[1].get("statusClass").and_then(|v| v.as_str()), Some("neutral"));

    let (code, error) = request_err(
        &mut stdin,
        &mut reader,
        "2",
        "grades.semester",
        json!({
            "subjects": [{
                "id": "bad",
                "categories": [{ "id": "a", "percentage": 100, "calculation_mode": "weird" }]
            }]
        }),
    );
    assert_eq!(code, "invalid_calculation_mode");
    assert_eq!(error.pointer("/details/subjectId").and_then(|v| v.as_str()), Some("bad"));
}

#[test]
fn incomplete_scheme_does_not_drop_other_semester_rows() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let r = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "grades.semester",
        json!({
            "subjects": [
                {
                    "id": "math",
                    "name": "Math",
                    "categories": [{ "id": "m", "percentage": 100 }],
                    "activitiesByCategory": { "m": [{ "max_score": 100, "obtained_score": 90 }] }
                },
                {
                    "id": "hist",
                    "name": "History",
                    "categories": [{ "id": "h", "percentage": 60 }],
                    "activitiesByCategory": { "h": [{ "max_score": 100, "obtained_score": 90 }] }
                }
            ]
        }),
    );
    let rows = r.get("rows").and_then(|v| v.as_array()).expect("rows");
    assert_eq!(rows.len(), 2);

    assert_eq!(rows[0].get("grade").and_then(|v| v.as_f64()), Some(90.0));
    assert!(rows[0].get("weightError").is_none());

    assert_eq!(rows[1].get("subjectId").and_then(|v| v.as_str()), Some("hist"));
    assert_eq!(rows[1].get("grade").and_then(|v| v.as_f64()), Some(54.0));
    assert_eq!(
        rows[1].pointer("/weightError/code").and_then(|v| v.as_str()),
        Some("invalid_category_weights")
    );
    assert_eq!(
        rows[1].pointer("/weightError/details/total").and_then(|v| v.as_f64()),
        Some(60.0)
    );
}

#[test]
fn category_weight_checks_follow_form_rules() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let categories = json!([
        { "id": "a", "percentage": 60, "calculation_mode": "dynamic" },
        { "id": "b", "percentage": 30, "calculation_mode": "dynamic" }
    ]);

    let w = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "categories.weights",
        json!({ "categories": categories.clone() }),
    );
    assert_eq!(w.get("total").and_then(|v| v.as_f64()), Some(90.0));
    assert_eq!(w.get("available").and_then(|v| v.as_f64()), Some(10.0));
    assert_eq!(w.get("complete").and_then(|v| v.as_bool()), Some(false));

    let c = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "categories.checkWeight",
        json!({ "categories": categories.clone(), "percentage": 40, "editingId": "b" }),
    );
    assert_eq!(c.get("newTotal").and_then(|v| v.as_f64()), Some(100.0));

    let (code, _) = request_err(
        &mut stdin,
        &mut reader,
        "3",
        "categories.checkWeight",
        json!({ "categories": categories.clone(), "percentage": 20 }),
    );
    assert_eq!(code, "invalid_category_weights");

    for (id, percentage) in [("4", 0.0), ("5", -20.0)] {
        let (code, error) = request_err(
            &mut stdin,
            &mut reader,
            id,
            "categories.checkWeight",
            json!({ "categories": categories.clone(), "percentage": percentage }),
        );
        assert_eq!(code, "invalid_category_percentage");
        assert_eq!(
            error.pointer("/details/percentage").and_then(|v| v.as_f64()),
            Some(percentage)
        );
    }
}
