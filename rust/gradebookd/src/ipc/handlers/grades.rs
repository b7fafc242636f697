use crate::calc;
use crate::ipc::error::{err, grade_err, ok};
use crate::ipc::helpers::{
    optional_f64, optional_param, parse_params, required_f64, required_param, required_str,
    validation_policy,
};
use crate::ipc::types::{AppState, Request};
use crate::records::{ActivityRecord, CategoryRecord, SubjectRecord};
use serde::Deserialize;
use serde_json::json;

fn handle_percentage(_state: &mut AppState, req: &Request) -> serde_json::Value {
    let obtained = match optional_f64(req, "obtainedScore") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let max = match optional_f64(req, "maxScore") {
        Ok(v) => v,
        Err(e) => return e,
    };
    ok(
        &req.id,
        json!({ "percentage": calc::percentage_of(obtained, max) }),
    )
}

fn handle_letter(_state: &mut AppState, req: &Request) -> serde_json::Value {
    let percentage = match required_f64(req, "percentage") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let grade = calc::letter_grade(percentage);
    ok(
        &req.id,
        json!({
            "letter": grade.letter,
            "status": grade.status,
            "statusClass": calc::status_style_class(grade.letter),
        }),
    )
}

fn handle_status_class(_state: &mut AppState, req: &Request) -> serde_json::Value {
    let letter = match required_str(req, "letter") {
        Ok(v) => v,
        Err(e) => return e,
    };
    ok(
        &req.id,
        json!({ "statusClass": calc::status_style_class_str(&letter) }),
    )
}

fn handle_activity(state: &mut AppState, req: &Request) -> serde_json::Value {
    let policy = match validation_policy(state, req) {
        Ok(p) => p,
        Err(e) => return e,
    };
    let record: ActivityRecord = match required_param(req, "activity") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let activity = match record.into_activity(policy) {
        Ok(a) => a,
        Err(e) => return grade_err(&req.id, &e),
    };
    let grade = calc::activity_grade(&activity);
    ok(
        &req.id,
        json!({
            "percentage": grade.percentage,
            "letter": grade.letter,
            "status": grade.status,
            "pending": grade.pending,
            "statusClass": calc::status_style_class(grade.letter),
        }),
    )
}

fn handle_category_contribution(state: &mut AppState, req: &Request) -> serde_json::Value {
    let policy = match validation_policy(state, req) {
        Ok(p) => p,
        Err(e) => return e,
    };
    let category: CategoryRecord = match required_param(req, "category") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let activities: Vec<ActivityRecord> = match optional_param(req, "activities") {
        Ok(v) => v,
        Err(e) => return e,
    };

    let category = match category.into_category(policy) {
        Ok(c) => c,
        Err(e) => return grade_err(&req.id, &e),
    };
    let activities = match activities
        .into_iter()
        .map(|a| a.into_activity(policy))
        .collect::<Result<Vec<_>, _>>()
    {
        Ok(v) => v,
        Err(e) => return grade_err(&req.id, &e),
    };

    let breakdown = calc::category_breakdown(&category, &activities);
    if breakdown.over_recorded {
        tracing::warn!(
            category = %category.id,
            completed = breakdown.completed,
            "fixed category has more completed activities than declared"
        );
    }
    ok(
        &req.id,
        json!({
            "contribution": breakdown.contribution,
            "breakdown": breakdown,
        }),
    )
}

fn handle_subject(state: &mut AppState, req: &Request) -> serde_json::Value {
    let policy = match validation_policy(state, req) {
        Ok(p) => p,
        Err(e) => return e,
    };
    let record: SubjectRecord = match parse_params(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let subject = match record.into_subject(policy, state.settings.min_passing_grade_default) {
        Ok(s) => s,
        Err(e) => return grade_err(&req.id, &e),
    };

    let breakdown = calc::subject_breakdown(&subject.categories, &subject.activities_by_category);
    let meets_minimum = breakdown.result.meets(subject.min_passing_grade);
    let mut result = json!(breakdown);
    result["minPassingGrade"] = json!(subject.min_passing_grade);
    result["meetsMinimum"] = json!(meets_minimum);
    result["validation"] = json!(policy);
    if let Some(e) = &subject.weight_error {
        warn_weights(&subject, e);
        result["weightError"] = json!(calc::GradeWarning::from(e));
    }
    ok(&req.id, result)
}

fn warn_weights(subject: &calc::Subject, e: &calc::GradeError) {
    tracing::warn!(subject = %subject.id, error = %e, "grading an incomplete scheme");
}

#[derive(Debug, Deserialize)]
struct SemesterParams {
    #[serde(default)]
    subjects: Vec<SubjectRecord>,
}

fn handle_semester(state: &mut AppState, req: &Request) -> serde_json::Value {
    let policy = match validation_policy(state, req) {
        Ok(p) => p,
        Err(e) => return e,
    };
    let params: SemesterParams = match parse_params(req) {
        Ok(v) => v,
        Err(e) => return e,
    };

    let mut subjects = Vec::with_capacity(params.subjects.len());
    for record in params.subjects {
        let subject_id = record.id.clone();
        match record.into_subject(policy, state.settings.min_passing_grade_default) {
            Ok(s) => {
                if let Some(e) = &s.weight_error {
                    warn_weights(&s, e);
                }
                subjects.push(s);
            }
            Err(e) => {
                let mut details = e.details();
                details["subjectId"] = json!(subject_id);
                return err(&req.id, e.code(), e.to_string(), Some(details));
            }
        }
    }

    let rows = calc::semester_overview(&subjects);
    ok(&req.id, json!({ "rows": rows }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "grades.percentage" => Some(handle_percentage(state, req)),
        "grades.letter" => Some(handle_letter(state, req)),
        "grades.statusClass" => Some(handle_status_class(state, req)),
        "grades.activity" => Some(handle_activity(state, req)),
        "grades.categoryContribution" => Some(handle_category_contribution(state, req)),
        "grades.subject" => Some(handle_subject(state, req)),
        "grades.semester" => Some(handle_semester(state, req)),
        _ => None,
    }
}
