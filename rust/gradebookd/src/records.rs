//! Wire records as the storage collaborator hands them over, and their
//! conversion into engine types.
//!
//! Field names follow the snake_case rows of the hosted backend; camelCase
//! aliases are accepted so IPC callers can send either shape.

use crate::calc::{Activity, ActivityScore, CalculationMode, Category, GradeError, Subject};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const WEIGHT_EPSILON: f64 = 1e-9;
pub const DEFAULT_MIN_PASSING_GRADE: f64 = 61.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationPolicy {
    /// Reject out-of-range scores and percentages; flag incomplete schemes.
    #[default]
    Strict,
    /// Let values flow through unclamped. The mode set is still closed.
    Lenient,
}

impl ValidationPolicy {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Some(ValidationPolicy::Strict),
            "lenient" => Some(ValidationPolicy::Lenient),
            _ => None,
        }
    }
}

fn default_mode() -> String {
    "dynamic".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CategoryRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub percentage: f64,
    #[serde(default = "default_mode", alias = "calculationMode")]
    pub calculation_mode: String,
    #[serde(default, alias = "totalActivities")]
    pub total_activities: Option<i64>,
}

impl CategoryRecord {
    pub fn into_category(self, policy: ValidationPolicy) -> Result<Category, GradeError> {
        let mode = CalculationMode::parse(&self.calculation_mode, self.total_activities)?;
        let category = match policy {
            ValidationPolicy::Strict => Category::new(self.id, self.percentage, mode)?,
            ValidationPolicy::Lenient => Category::unchecked(self.id, self.percentage, mode),
        };
        if self.name.is_empty() {
            Ok(category)
        } else {
            Ok(category.named(self.name))
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ActivityRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, alias = "categoryId")]
    pub category_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(alias = "maxScore")]
    pub max_score: f64,
    #[serde(default, alias = "obtainedScore")]
    pub obtained_score: Option<f64>,
    #[serde(default, alias = "isPending")]
    pub is_pending: bool,
}

impl ActivityRecord {
    pub fn into_activity(self, policy: ValidationPolicy) -> Result<Activity, GradeError> {
        let activity = match (policy, self.is_pending) {
            (ValidationPolicy::Strict, true) => Activity::pending(self.max_score)?,
            (ValidationPolicy::Strict, false) => {
                let Some(obtained) = self.obtained_score else {
                    return Err(GradeError::InvalidScore {
                        message: "completed activity needs an obtained score".to_string(),
                        obtained: None,
                        max: self.max_score,
                    });
                };
                Activity::scored(self.max_score, obtained)?
            }
            (ValidationPolicy::Lenient, pending) => Activity {
                name: None,
                max_score: self.max_score,
                score: if pending {
                    ActivityScore::Pending
                } else {
                    // A missing score on a completed row reads as 0%.
                    ActivityScore::Scored(self.obtained_score.unwrap_or(0.0))
                },
            },
        };
        Ok(match self.name {
            Some(name) => activity.named(name),
            None => activity,
        })
    }
}

/// Groups a flat activity listing by `category_id`. Rows without one are
/// dropped, as they cannot belong to any category of the subject.
pub fn group_by_category(
    activities: Vec<ActivityRecord>,
) -> HashMap<String, Vec<ActivityRecord>> {
    let mut out: HashMap<String, Vec<ActivityRecord>> = HashMap::new();
    for a in activities {
        let Some(cat) = a.category_id.clone() else {
            continue;
        };
        out.entry(cat).or_default().push(a);
    }
    out
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, alias = "min_passing_grade")]
    pub min_passing_grade: Option<f64>,
    #[serde(default)]
    pub categories: Vec<CategoryRecord>,
    #[serde(default, alias = "activities_by_category")]
    pub activities_by_category: HashMap<String, Vec<ActivityRecord>>,
    #[serde(default)]
    pub activities: Vec<ActivityRecord>,
}

impl SubjectRecord {
    pub fn into_subject(
        self,
        policy: ValidationPolicy,
        default_min_passing_grade: f64,
    ) -> Result<Subject, GradeError> {
        let mut grouped = self.activities_by_category;
        for (cat, rows) in group_by_category(self.activities) {
            grouped.entry(cat).or_default().extend(rows);
        }
        let (categories, activities_by_category) =
            build_scheme(self.categories, grouped, policy)?;
        let weight_error = scheme_weight_error(&categories, policy);
        Ok(Subject {
            id: self.id,
            name: self.name,
            min_passing_grade: self.min_passing_grade.unwrap_or(default_min_passing_grade),
            categories,
            activities_by_category,
            weight_error,
        })
    }
}

/// Converts a subject's grading scheme. Weight totals are not checked here;
/// see [`scheme_weight_error`].
pub fn build_scheme(
    categories: Vec<CategoryRecord>,
    activities_by_category: HashMap<String, Vec<ActivityRecord>>,
    policy: ValidationPolicy,
) -> Result<(Vec<Category>, HashMap<String, Vec<Activity>>), GradeError> {
    let categories = categories
        .into_iter()
        .map(|c| c.into_category(policy))
        .collect::<Result<Vec<_>, _>>()?;

    let mut by_category: HashMap<String, Vec<Activity>> = HashMap::new();
    for (cat, rows) in activities_by_category {
        let activities = rows
            .into_iter()
            .map(|a| a.into_activity(policy))
            .collect::<Result<Vec<_>, _>>()?;
        by_category.insert(cat, activities);
    }

    Ok((categories, by_category))
}

/// Strict schemes that do not total 100% are graded anyway and carry this
/// error as a warning. Empty schemes stay ungraded without one.
pub fn scheme_weight_error(
    categories: &[Category],
    policy: ValidationPolicy,
) -> Option<GradeError> {
    if policy == ValidationPolicy::Lenient || categories.is_empty() {
        return None;
    }
    validate_category_weights(categories).err()
}

pub fn weights_total(categories: &[Category], exclude_id: Option<&str>) -> f64 {
    categories
        .iter()
        .filter(|c| exclude_id.map(|id| c.id != id).unwrap_or(true))
        .map(|c| c.percentage)
        .sum()
}

pub fn available_percentage(categories: &[Category], exclude_id: Option<&str>) -> f64 {
    100.0 - weights_total(categories, exclude_id)
}

/// Total the scheme would reach after adding a category with `percentage`,
/// or replacing `editing_id`'s weight with it. The percentage itself must be
/// in (0, 100] and the total may not exceed 100%.
pub fn check_weight_change(
    categories: &[Category],
    percentage: f64,
    editing_id: Option<&str>,
) -> Result<f64, GradeError> {
    if !percentage.is_finite() || percentage <= 0.0 || percentage > 100.0 {
        return Err(GradeError::InvalidCategoryPercentage(percentage));
    }
    let others = weights_total(categories, editing_id);
    let new_total = others + percentage;
    if new_total > 100.0 + WEIGHT_EPSILON {
        return Err(GradeError::InvalidCategoryWeights {
            total: others,
            message: format!(
                "total would exceed 100% ({new_total}%), max available {}%",
                100.0 - others
            ),
        });
    }
    Ok(new_total)
}

pub fn validate_category_weights(categories: &[Category]) -> Result<f64, GradeError> {
    let total = weights_total(categories, None);
    if (total - 100.0).abs() > WEIGHT_EPSILON {
        return Err(GradeError::InvalidCategoryWeights {
            total,
            message: "category percentages must sum to 100".to_string(),
        });
    }
    Ok(total)
}
