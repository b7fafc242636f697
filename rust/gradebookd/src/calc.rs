use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

pub const PASSING_BANDS: [(f64, Letter, &str); 4] = [
    (91.0, Letter::A, "Excellent"),
    (81.0, Letter::B, "Very good"),
    (71.0, Letter::C, "Passed"),
    (61.0, Letter::D, "Passed with warning"),
];
pub const FAILED_STATUS: &str = "Failed";
pub const UNGRADED_STATUS: &str = "Ungraded";
pub const PENDING_STATUS: &str = "Pending";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GradeError {
    #[error("invalid score: {message}")]
    InvalidScore {
        message: String,
        obtained: Option<f64>,
        max: f64,
    },
    #[error("invalid calculation mode: {0:?} (expected dynamic or fixed)")]
    InvalidCalculationMode(String),
    #[error("invalid category weights: {message} (total {total}%)")]
    InvalidCategoryWeights { total: f64, message: String },
    #[error("category percentage must be in (0, 100], got {0}")]
    InvalidCategoryPercentage(f64),
    #[error("fixed mode needs a positive activity count, got {0}")]
    InvalidTotalActivities(i64),
}

impl GradeError {
    pub fn code(&self) -> &'static str {
        match self {
            GradeError::InvalidScore { .. } => "invalid_score",
            GradeError::InvalidCalculationMode(_) => "invalid_calculation_mode",
            GradeError::InvalidCategoryWeights { .. } => "invalid_category_weights",
            GradeError::InvalidCategoryPercentage(_) => "invalid_category_percentage",
            GradeError::InvalidTotalActivities(_) => "invalid_total_activities",
        }
    }

    pub fn details(&self) -> serde_json::Value {
        match self {
            GradeError::InvalidScore { obtained, max, .. } => serde_json::json!({
                "obtainedScore": obtained,
                "maxScore": max,
            }),
            GradeError::InvalidCalculationMode(mode) => {
                serde_json::json!({ "calculationMode": mode })
            }
            GradeError::InvalidCategoryWeights { total, .. } => serde_json::json!({
                "total": total,
                "available": 100.0 - total,
            }),
            GradeError::InvalidCategoryPercentage(p) => serde_json::json!({ "percentage": p }),
            GradeError::InvalidTotalActivities(n) => serde_json::json!({ "totalActivities": n }),
        }
    }
}

/// A [`GradeError`] reported alongside a result instead of replacing it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradeWarning {
    pub code: &'static str,
    pub message: String,
    pub details: serde_json::Value,
}

impl From<&GradeError> for GradeWarning {
    fn from(e: &GradeError) -> Self {
        Self {
            code: e.code(),
            message: e.to_string(),
            details: e.details(),
        }
    }
}

/// JS-compatible half-up rounding (`Math.round(x * 10^d) / 10^d`).
pub fn round_half_up(x: f64, decimals: i32) -> f64 {
    let scale = 10_f64.powi(decimals);
    ((x * scale) + 0.5).floor() / scale
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActivityScore {
    Pending,
    Scored(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Activity {
    pub name: Option<String>,
    pub max_score: f64,
    pub score: ActivityScore,
}

impl Activity {
    pub fn scored(max_score: f64, obtained: f64) -> Result<Self, GradeError> {
        check_max_score(max_score, Some(obtained))?;
        if !obtained.is_finite() || obtained < 0.0 || obtained > max_score {
            return Err(GradeError::InvalidScore {
                message: format!("obtained score must be within [0, {max_score}]"),
                obtained: Some(obtained),
                max: max_score,
            });
        }
        Ok(Self {
            name: None,
            max_score,
            score: ActivityScore::Scored(obtained),
        })
    }

    pub fn pending(max_score: f64) -> Result<Self, GradeError> {
        check_max_score(max_score, None)?;
        Ok(Self {
            name: None,
            max_score,
            score: ActivityScore::Pending,
        })
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.score, ActivityScore::Pending)
    }

    pub fn obtained(&self) -> Option<f64> {
        match self.score {
            ActivityScore::Pending => None,
            ActivityScore::Scored(v) => Some(v),
        }
    }

    /// Pending activities read as 0%.
    pub fn percentage(&self) -> f64 {
        percentage_of(self.obtained(), Some(self.max_score))
    }
}

fn check_max_score(max_score: f64, obtained: Option<f64>) -> Result<(), GradeError> {
    if max_score.is_finite() && max_score > 0.0 {
        return Ok(());
    }
    Err(GradeError::InvalidScore {
        message: "max score must be greater than 0".to_string(),
        obtained,
        max: max_score,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalculationMode {
    Dynamic,
    Fixed { total_activities: u32 },
}

impl CalculationMode {
    pub fn parse(mode: &str, total_activities: Option<i64>) -> Result<Self, GradeError> {
        match mode.trim().to_ascii_lowercase().as_str() {
            "dynamic" => Ok(CalculationMode::Dynamic),
            "fixed" => {
                let n = total_activities.unwrap_or(0);
                match u32::try_from(n) {
                    Ok(total) if total > 0 => Ok(CalculationMode::Fixed {
                        total_activities: total,
                    }),
                    _ => Err(GradeError::InvalidTotalActivities(n)),
                }
            }
            _ => Err(GradeError::InvalidCalculationMode(mode.to_string())),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CalculationMode::Dynamic => "dynamic",
            CalculationMode::Fixed { .. } => "fixed",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub percentage: f64,
    pub mode: CalculationMode,
}

impl Category {
    pub fn new(
        id: impl Into<String>,
        percentage: f64,
        mode: CalculationMode,
    ) -> Result<Self, GradeError> {
        if !percentage.is_finite() || percentage <= 0.0 || percentage > 100.0 {
            return Err(GradeError::InvalidCategoryPercentage(percentage));
        }
        if mode == (CalculationMode::Fixed { total_activities: 0 }) {
            return Err(GradeError::InvalidTotalActivities(0));
        }
        Ok(Self::unchecked(id, percentage, mode))
    }

    /// Skips the range checks; the percentage is taken as given.
    pub fn unchecked(id: impl Into<String>, percentage: f64, mode: CalculationMode) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            percentage,
            mode,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Share of the category each declared activity is worth in fixed mode.
    pub fn activity_weight(&self) -> Option<f64> {
        match self.mode {
            CalculationMode::Dynamic => None,
            CalculationMode::Fixed { total_activities: 0 } => None,
            CalculationMode::Fixed { total_activities } => {
                Some(self.percentage / f64::from(total_activities))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Letter {
    A,
    B,
    C,
    D,
    F,
    #[serde(rename = "N/A")]
    NotApplicable,
}

impl Letter {
    pub fn as_str(self) -> &'static str {
        match self {
            Letter::A => "A",
            Letter::B => "B",
            Letter::C => "C",
            Letter::D => "D",
            Letter::F => "F",
            Letter::NotApplicable => "N/A",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "A" => Some(Letter::A),
            "B" => Some(Letter::B),
            "C" => Some(Letter::C),
            "D" => Some(Letter::D),
            "F" => Some(Letter::F),
            "N/A" => Some(Letter::NotApplicable),
            _ => None,
        }
    }
}

impl fmt::Display for Letter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusClass {
    Success,
    Warning,
    Danger,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LetterGrade {
    pub letter: Letter,
    pub status: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeResult {
    pub grade: f64,
    pub letter: Letter,
    pub status: String,
    pub percent_complete: i64,
}

impl GradeResult {
    pub fn ungraded() -> Self {
        Self {
            grade: 0.0,
            letter: Letter::NotApplicable,
            status: UNGRADED_STATUS.to_string(),
            percent_complete: 0,
        }
    }

    pub fn is_ungraded(&self) -> bool {
        self.letter == Letter::NotApplicable && self.grade == 0.0
    }

    /// Semester table cell: `--` for ungraded subjects, otherwise one decimal.
    pub fn display(&self) -> String {
        if self.is_ungraded() {
            "--".to_string()
        } else {
            format!("{:.1}", self.grade)
        }
    }

    pub fn meets(&self, min_passing_grade: f64) -> bool {
        !self.is_ungraded() && self.grade >= min_passing_grade
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityGrade {
    pub percentage: f64,
    pub letter: Letter,
    pub status: &'static str,
    pub pending: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryBreakdown {
    pub category_id: String,
    pub name: String,
    pub percentage: f64,
    pub calculation_mode: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_activities: Option<u32>,
    pub contribution: f64,
    pub completed: usize,
    pub pending: usize,
    pub unrecorded: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity_weight: Option<f64>,
    pub evaluated_percentage: f64,
    pub over_recorded: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectBreakdown {
    #[serde(flatten)]
    pub result: GradeResult,
    pub status_class: StatusClass,
    pub categories: Vec<CategoryBreakdown>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Subject {
    pub id: String,
    pub name: String,
    pub min_passing_grade: f64,
    pub categories: Vec<Category>,
    pub activities_by_category: HashMap<String, Vec<Activity>>,
    /// Set when the scheme does not total 100%. The grade is still computed.
    pub weight_error: Option<GradeError>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SemesterRow {
    pub subject_id: String,
    pub name: String,
    pub min_passing_grade: f64,
    #[serde(flatten)]
    pub result: GradeResult,
    pub status_class: StatusClass,
    pub display: String,
    pub meets_minimum: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight_error: Option<GradeWarning>,
}

/// Missing or zero inputs yield 0 instead of an error. Not clamped.
pub fn percentage_of(obtained: Option<f64>, max: Option<f64>) -> f64 {
    let falsy = |v: f64| v == 0.0 || v.is_nan();
    match (obtained, max) {
        (Some(o), Some(m)) if !falsy(o) && !falsy(m) => (o / m) * 100.0,
        _ => 0.0,
    }
}

pub fn letter_grade(percentage: f64) -> LetterGrade {
    for (floor, letter, status) in PASSING_BANDS {
        if percentage >= floor {
            return LetterGrade { letter, status };
        }
    }
    LetterGrade {
        letter: Letter::F,
        status: FAILED_STATUS,
    }
}

pub fn status_style_class(letter: Letter) -> StatusClass {
    match letter {
        Letter::A | Letter::B | Letter::C => StatusClass::Success,
        Letter::D => StatusClass::Warning,
        Letter::F => StatusClass::Danger,
        Letter::NotApplicable => StatusClass::Neutral,
    }
}

pub fn status_style_class_str(letter: &str) -> StatusClass {
    Letter::parse(letter)
        .map(status_style_class)
        .unwrap_or(StatusClass::Neutral)
}

pub fn activity_grade(activity: &Activity) -> ActivityGrade {
    if activity.is_pending() {
        return ActivityGrade {
            percentage: 0.0,
            letter: Letter::NotApplicable,
            status: PENDING_STATUS,
            pending: true,
        };
    }
    let percentage = activity.percentage();
    let LetterGrade { letter, status } = letter_grade(percentage);
    ActivityGrade {
        percentage,
        letter,
        status,
        pending: false,
    }
}

fn completed(activities: &[Activity]) -> impl Iterator<Item = &Activity> {
    activities.iter().filter(|a| !a.is_pending())
}

pub fn category_contribution(category: &Category, activities: &[Activity]) -> f64 {
    let completed_count = completed(activities).count();
    if completed_count == 0 {
        return 0.0;
    }

    match category.mode {
        CalculationMode::Dynamic => {
            let sum: f64 = completed(activities).map(Activity::percentage).sum();
            let avg_percentage = sum / completed_count as f64;
            (avg_percentage / 100.0) * category.percentage
        }
        CalculationMode::Fixed { .. } => {
            let Some(slice) = category.activity_weight() else {
                return 0.0;
            };
            completed(activities)
                .map(|a| (a.percentage() / 100.0) * slice)
                .sum()
        }
    }
}

/// How much of the category's weight counts as evaluated. Dynamic categories
/// are all-or-nothing; fixed categories are proportional to recorded slots.
pub fn evaluated_percentage(category: &Category, activities: &[Activity]) -> f64 {
    let completed_count = completed(activities).count();
    match category.mode {
        CalculationMode::Dynamic => {
            if completed_count > 0 {
                category.percentage
            } else {
                0.0
            }
        }
        CalculationMode::Fixed { total_activities: 0 } => 0.0,
        CalculationMode::Fixed { total_activities } => {
            (completed_count as f64 / f64::from(total_activities)) * category.percentage
        }
    }
}

pub fn category_breakdown(category: &Category, activities: &[Activity]) -> CategoryBreakdown {
    let completed_count = completed(activities).count();
    let pending_count = activities.len() - completed_count;
    let (total_activities, unrecorded, over_recorded) = match category.mode {
        CalculationMode::Dynamic => (None, 0, false),
        CalculationMode::Fixed { total_activities } => {
            let total = total_activities as usize;
            (
                Some(total_activities),
                total.saturating_sub(activities.len()),
                completed_count > total,
            )
        }
    };

    CategoryBreakdown {
        category_id: category.id.clone(),
        name: category.name.clone(),
        percentage: category.percentage,
        calculation_mode: category.mode.as_str(),
        total_activities,
        contribution: category_contribution(category, activities),
        completed: completed_count,
        pending: pending_count,
        unrecorded,
        activity_weight: category.activity_weight(),
        evaluated_percentage: evaluated_percentage(category, activities),
        over_recorded,
    }
}

fn activities_for<'a>(
    activities_by_category: &'a HashMap<String, Vec<Activity>>,
    category: &Category,
) -> &'a [Activity] {
    activities_by_category
        .get(&category.id)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

pub fn subject_grade(
    categories: &[Category],
    activities_by_category: &HashMap<String, Vec<Activity>>,
) -> GradeResult {
    if categories.is_empty() {
        return GradeResult::ungraded();
    }

    let mut total_contribution = 0.0_f64;
    let mut percentage_evaluated = 0.0_f64;
    for category in categories {
        let activities = activities_for(activities_by_category, category);
        total_contribution += category_contribution(category, activities);
        percentage_evaluated += evaluated_percentage(category, activities);
    }

    let grade = round_half_up(total_contribution, 2);
    let LetterGrade { letter, status } = letter_grade(grade);
    GradeResult {
        grade,
        letter,
        status: status.to_string(),
        percent_complete: round_half_up(percentage_evaluated, 0) as i64,
    }
}

pub fn subject_breakdown(
    categories: &[Category],
    activities_by_category: &HashMap<String, Vec<Activity>>,
) -> SubjectBreakdown {
    let result = subject_grade(categories, activities_by_category);
    let categories = categories
        .iter()
        .map(|c| category_breakdown(c, activities_for(activities_by_category, c)))
        .collect();
    SubjectBreakdown {
        status_class: status_style_class(result.letter),
        result,
        categories,
    }
}

pub fn semester_overview(subjects: &[Subject]) -> Vec<SemesterRow> {
    subjects
        .iter()
        .map(|s| {
            let result = subject_grade(&s.categories, &s.activities_by_category);
            SemesterRow {
                subject_id: s.id.clone(),
                name: s.name.clone(),
                min_passing_grade: s.min_passing_grade,
                status_class: status_style_class(result.letter),
                display: result.display(),
                meets_minimum: result.meets(s.min_passing_grade),
                weight_error: s.weight_error.as_ref().map(GradeWarning::from),
                result,
            }
        })
        .collect()
}
