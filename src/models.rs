// ABOUTME: Stored document shapes for users, history collections, and LLM structured outputs
// ABOUTME: Partial profile updates are typed here; unknown fields are rejected before reaching the store
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 GlucoWise Contributors

//! # Data Models
//!
//! - [`UserRecord`] is the `users/{uid}` document. Profile fields fill in over time,
//!   so they are all optional ([`ProfileFields`]) until a computation needs them.
//! - History documents (`plans`, `advice`, `diabetes_checks`, `recipe_queries`,
//!   `diet_queries`, `chat_history`) carry `user_id` and a fixed-precision `timestamp`.
//! - [`DietPlanEntry`], [`Recipe`], [`MacroBreakdown`] and [`HealthAdvice`] are the
//!   structured outputs requested from the language model. Field names are part of the
//!   client contract.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use glucowise_core::models::{
    yes_no, ActivityLevel, BmiClass, BodyMeasurements, Goal, Jurisdiction, Profile, Race, Sex,
    SmokingHistory,
};
use glucowise_intelligence::{DerivedMetrics, RiskAssessment};

use crate::errors::{AppError, AppResult};
use crate::store::timestamp;

// ============================================================================
// User Document
// ============================================================================

/// Profile fields as stored, each optional until the user provides it
///
/// Also the body of partial profile updates: serializing skips absent fields, so the
/// serialized form is exactly the set of fields being changed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileFields {
    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Age in whole years
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    /// Biological sex
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sex: Option<Sex>,
    /// Height in centimeters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    /// Weight in kilograms
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<u32>,
    /// Habitual activity level
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_level: Option<ActivityLevel>,
    /// Nutrition goal
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal: Option<Goal>,
    /// Race category
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub race: Option<Race>,
    /// Smoking history
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smoking_history: Option<SmokingHistory>,
    /// Jurisdiction of residence
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Jurisdiction>,
    /// Diagnosed hypertension
    #[serde(default, skip_serializing_if = "Option::is_none", with = "yes_no::option")]
    pub hypertension: Option<bool>,
    /// Diagnosed heart disease
    #[serde(default, skip_serializing_if = "Option::is_none", with = "yes_no::option")]
    pub heart_disease: Option<bool>,
    /// Most recent `HbA1c` reading
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hba1c: Option<f64>,
    /// Most recent blood glucose reading
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blood_glucose: Option<f64>,
    /// Prefers vegan meal plans
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vegan: Option<bool>,
}

impl ProfileFields {
    /// Every field name a partial update may carry
    pub const FIELDS: [&'static str; 15] = [
        "display_name",
        "age",
        "sex",
        "height",
        "weight",
        "activity_level",
        "goal",
        "race",
        "smoking_history",
        "location",
        "hypertension",
        "heart_disease",
        "hba1c",
        "blood_glucose",
        "vegan",
    ];

    /// Parse a partial update, rejecting unknown fields and out-of-set categories
    ///
    /// # Errors
    ///
    /// - `InvalidInput` if the body is empty, not an object, or names an unknown field
    /// - `UnknownCategory` / `InvalidInput` if a value does not parse
    pub fn parse_update(body: Value, empty_message: &str) -> AppResult<Self> {
        let map = match body {
            Value::Object(map) if !map.is_empty() => map,
            Value::Object(_) | Value::Null => return Err(AppError::invalid_input(empty_message)),
            _ => return Err(AppError::invalid_input("Request body must be a JSON object")),
        };

        let unknown: Vec<&str> = map
            .keys()
            .map(String::as_str)
            .filter(|key| !Self::FIELDS.contains(key))
            .collect();
        if !unknown.is_empty() {
            return Err(AppError::invalid_input(format!(
                "Unknown profile fields: {}",
                unknown.join(", ")
            ))
            .with_details(serde_json::json!({ "fields": unknown })));
        }

        Self::check_categories(&map)?;
        Self::check_whole_numbers(&map)?;
        serde_json::from_value(Value::Object(map))
            .map_err(|e| AppError::invalid_input(format!("Invalid profile update: {e}")))
    }

    /// Parse categorical strings up front so failures carry the field and value
    fn check_categories(map: &Map<String, Value>) -> AppResult<()> {
        for (key, value) in map {
            let Some(text) = value.as_str() else {
                continue;
            };
            match key.as_str() {
                "sex" => {
                    text.parse::<Sex>()?;
                }
                "activity_level" => {
                    text.parse::<ActivityLevel>()?;
                }
                "goal" => {
                    text.parse::<Goal>()?;
                }
                "race" => {
                    text.parse::<Race>()?;
                }
                "smoking_history" => {
                    text.parse::<SmokingHistory>()?;
                }
                "location" => {
                    text.parse::<Jurisdiction>()?;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Age, height and weight are stored as whole numbers; say so instead of a serde error
    fn check_whole_numbers(map: &Map<String, Value>) -> AppResult<()> {
        for (field, unit) in [("age", "years"), ("height", "centimeters"), ("weight", "kilograms")] {
            let Some(value) = map.get(field) else {
                continue;
            };
            if value.is_null() || value.as_u64().is_some_and(|v| u32::try_from(v).is_ok()) {
                continue;
            }
            return Err(AppError::invalid_input(format!(
                "{field} must be a non-negative whole number of {unit}, got {value}"
            ))
            .with_details(serde_json::json!({ "field": field, "value": value })));
        }
        Ok(())
    }

    /// Serialize only the fields that are set
    ///
    /// # Errors
    ///
    /// Returns a serialization error if encoding fails
    pub fn to_partial(&self) -> AppResult<Map<String, Value>> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            _ => Err(AppError::serialization("Profile update did not encode as an object")),
        }
    }

    /// Build a complete [`Profile`], naming every missing field on failure
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` listing the fields still missing
    pub fn to_profile(&self) -> AppResult<Profile> {
        let mut missing = Vec::new();
        macro_rules! need {
            ($field:ident) => {{
                if self.$field.is_none() {
                    missing.push(stringify!($field));
                }
                self.$field
            }};
        }

        let age = need!(age);
        let sex = need!(sex);
        let height = need!(height);
        let weight = need!(weight);
        let activity_level = need!(activity_level);
        let goal = need!(goal);
        let race = need!(race);
        let smoking_history = need!(smoking_history);
        let location = need!(location);
        let hypertension = need!(hypertension);
        let heart_disease = need!(heart_disease);
        let hba1c = need!(hba1c);
        let blood_glucose = need!(blood_glucose);

        match (
            age,
            sex,
            height,
            weight,
            activity_level,
            goal,
            race,
            smoking_history,
            location,
            hypertension,
            heart_disease,
            hba1c,
            blood_glucose,
        ) {
            (
                Some(age),
                Some(sex),
                Some(height_cm),
                Some(weight_kg),
                Some(activity_level),
                Some(goal),
                Some(race),
                Some(smoking_history),
                Some(location),
                Some(hypertension),
                Some(heart_disease),
                Some(hba1c),
                Some(blood_glucose),
            ) => Ok(Profile {
                age,
                sex,
                height_cm,
                weight_kg,
                activity_level,
                goal,
                race,
                smoking_history,
                location,
                hypertension,
                heart_disease,
                hba1c,
                blood_glucose,
            }),
            _ => Err(incomplete_profile(&missing)),
        }
    }

    /// Build the [`BodyMeasurements`] the metrics chain needs
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` listing the body fields still missing
    pub fn to_body(&self) -> AppResult<BodyMeasurements> {
        if let (
            Some(age),
            Some(sex),
            Some(height_cm),
            Some(weight_kg),
            Some(activity_level),
            Some(goal),
        ) = (
            self.age,
            self.sex,
            self.height,
            self.weight,
            self.activity_level,
            self.goal,
        ) {
            return Ok(BodyMeasurements {
                age,
                sex,
                height_cm,
                weight_kg,
                activity_level,
                goal,
            });
        }

        let missing: Vec<&str> = [
            ("age", self.age.is_none()),
            ("sex", self.sex.is_none()),
            ("height", self.height.is_none()),
            ("weight", self.weight.is_none()),
            ("activity_level", self.activity_level.is_none()),
            ("goal", self.goal.is_none()),
        ]
        .into_iter()
        .filter_map(|(field, absent)| absent.then_some(field))
        .collect();
        Err(incomplete_profile(&missing))
    }
}

fn incomplete_profile(missing: &[&str]) -> AppError {
    AppError::invalid_input(format!(
        "Profile is incomplete; missing: {}",
        missing.join(", ")
    ))
    .with_details(serde_json::json!({ "missing_fields": missing }))
}

/// Metrics snapshot saved on the user document
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StoredMetrics {
    /// Derived values
    #[serde(flatten)]
    pub metrics: DerivedMetrics,
    /// When they were computed
    #[serde(with = "timestamp")]
    pub calculated_at: DateTime<Utc>,
}

/// The `users/{uid}` document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Account email
    pub email: String,
    /// Creation time
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    /// Most recent sign-in
    #[serde(with = "timestamp")]
    pub last_login: DateTime<Utc>,
    /// Profile fields provided so far
    #[serde(flatten)]
    pub profile: ProfileFields,
    /// Last computed metrics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_metrics: Option<StoredMetrics>,
}

impl UserRecord {
    /// New document for a freshly registered account
    #[must_use]
    pub fn new(email: impl Into<String>, display_name: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            email: email.into(),
            created_at: now,
            last_login: now,
            profile: ProfileFields {
                display_name,
                ..ProfileFields::default()
            },
            last_metrics: None,
        }
    }
}

// ============================================================================
// Language Model Outputs
// ============================================================================

/// One meal in a generated diet plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DietPlanEntry {
    /// Breakfast, lunch, ...
    pub mealtime: String,
    /// Dish name
    pub food_item: String,
    /// Calories (kcal)
    pub calories: i64,
    /// Protein grams
    pub protein: i64,
    /// Carbohydrate grams
    pub carbs: i64,
    /// Fat grams
    pub fat: i64,
}

/// A generated recipe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    /// Recipe title
    pub recipe_name: String,
    /// Calories (kcal)
    pub calories: i64,
    /// Protein grams
    pub protein: i64,
    /// Fat grams
    pub fats: i64,
    /// Carbohydrate grams
    pub carbs: i64,
    /// Ingredient list as free text
    pub ingredients: String,
}

/// One nutrient line of a macro breakdown
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacroBreakdown {
    /// Nutrient name
    pub nutrient: String,
    /// Amount with unit
    pub amount: String,
}

/// Generated health advice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthAdvice {
    /// General recommendations
    pub general_recommendations: String,
    /// Exercise suggestions
    pub exercise_suggestions: String,
    /// Dietary advice
    pub dietary_advice: String,
    /// Health risks to watch
    pub health_risks: String,
    /// Lifestyle tips
    pub lifestyle_tips: String,
}

// ============================================================================
// History Documents
// ============================================================================

/// Metrics subset attached to advice (no macros)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdviceMetrics {
    /// Body mass index
    pub bmi: f64,
    /// BMI band
    pub bmi_class: BmiClass,
    /// Basal metabolic rate
    pub bmr: f64,
    /// Total daily energy expenditure
    pub tdee: f64,
}

impl From<&DerivedMetrics> for AdviceMetrics {
    fn from(metrics: &DerivedMetrics) -> Self {
        Self {
            bmi: metrics.bmi,
            bmi_class: metrics.bmi_class,
            bmr: metrics.bmr,
            tdee: metrics.tdee,
        }
    }
}

/// `plans` document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanRecord {
    /// Owner
    pub user_id: String,
    /// Preferences the plan was generated for
    pub preferences: String,
    /// Meals
    pub plan: Vec<DietPlanEntry>,
    /// Creation time
    #[serde(with = "timestamp")]
    pub timestamp: DateTime<Utc>,
}

/// `advice` document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdviceRecord {
    /// Owner
    pub user_id: String,
    /// Advice sections
    pub advice: Vec<HealthAdvice>,
    /// Metrics the advice was based on
    pub metrics: AdviceMetrics,
    /// Creation time
    #[serde(with = "timestamp")]
    pub timestamp: DateTime<Utc>,
}

/// `diabetes_checks` document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiabetesCheckRecord {
    /// Owner
    pub user_id: String,
    /// Label and code
    #[serde(flatten)]
    pub assessment: RiskAssessment,
    /// BMI the assessment used
    pub bmi: f64,
    /// Creation time
    #[serde(with = "timestamp")]
    pub timestamp: DateTime<Utc>,
}

/// `recipe_queries` document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeQueryRecord {
    /// Owner
    pub user_id: String,
    /// Recognized food
    pub food_name: String,
    /// Recognition confidence
    pub confidence: f64,
    /// Generated recipes
    pub recipe: Vec<Recipe>,
    /// Creation time
    #[serde(with = "timestamp")]
    pub timestamp: DateTime<Utc>,
}

/// `diet_queries` document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DietQueryRecord {
    /// Owner
    pub user_id: String,
    /// Food that was looked up
    pub food_item: String,
    /// Macro lines returned
    pub response: Vec<MacroBreakdown>,
    /// Creation time
    #[serde(with = "timestamp")]
    pub timestamp: DateTime<Utc>,
}

/// `chat_history` document: one user message and the model's reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    /// Owner
    pub user_id: String,
    /// What the user said
    pub message: String,
    /// What the model answered
    pub response: String,
    /// When the turn completed
    #[serde(with = "timestamp")]
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_update_rejects_unknown_fields() {
        let err = ProfileFields::parse_update(json!({"age": 40, "favorite_color": "blue"}), "x")
            .unwrap_err();
        assert_eq!(err.code, crate::errors::ErrorCode::InvalidInput);
        assert!(err.message.contains("favorite_color"));
    }

    #[test]
    fn test_parse_update_reports_unknown_category() {
        let err = ProfileFields::parse_update(json!({"sex": "Unknown"}), "x").unwrap_err();
        assert_eq!(err.code, crate::errors::ErrorCode::UnknownCategory);
    }

    #[test]
    fn test_fractional_measurement_names_the_unit() {
        let err = ProfileFields::parse_update(json!({"weight": 70.5}), "x").unwrap_err();
        assert_eq!(err.code, crate::errors::ErrorCode::InvalidInput);
        assert_eq!(
            err.message,
            "weight must be a non-negative whole number of kilograms, got 70.5"
        );
        assert_eq!(err.details["field"], "weight");

        let err = ProfileFields::parse_update(json!({"height": "175"}), "x").unwrap_err();
        assert!(err.message.contains("whole number of centimeters"));

        let err = ProfileFields::parse_update(json!({"age": -3}), "x").unwrap_err();
        assert!(err.message.contains("whole number of years"));
    }

    #[test]
    fn test_partial_contains_only_set_fields() {
        let update =
            ProfileFields::parse_update(json!({"weight": 80, "hypertension": "No"}), "x").unwrap();
        let partial = update.to_partial().unwrap();
        let mut keys: Vec<&str> = partial.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, ["hypertension", "weight"]);
        assert_eq!(partial["hypertension"], json!(false));
    }

    #[test]
    fn test_incomplete_profile_lists_missing_fields() {
        let fields = ProfileFields {
            age: Some(30),
            ..ProfileFields::default()
        };
        let err = fields.to_profile().unwrap_err();
        assert!(err.message.contains("sex"));
        assert!(err.message.contains("blood_glucose"));
        assert!(!err.message.contains("age,"));
    }

    #[test]
    fn test_body_needs_only_measurements() {
        let fields = ProfileFields::parse_update(
            json!({
                "age": 30,
                "sex": "Male",
                "height": 175,
                "weight": 70,
                "activity_level": "Sedentary",
                "goal": "maintain"
            }),
            "x",
        )
        .unwrap();
        let body = fields.to_body().unwrap();
        assert_eq!(body.height_cm, 175);
        assert_eq!(body.goal, Goal::Maintain);
        assert!(fields.to_profile().is_err());

        let err = ProfileFields::default().to_body().unwrap_err();
        assert!(err.message.ends_with("age, sex, height, weight, activity_level, goal"));
    }

    #[test]
    fn test_diet_plan_entry_uses_camel_case() {
        let entry: DietPlanEntry = serde_json::from_value(json!({
            "mealtime": "Breakfast",
            "foodItem": "Oatmeal",
            "calories": 300,
            "protein": 10,
            "carbs": 50,
            "fat": 6
        }))
        .unwrap();
        assert_eq!(entry.food_item, "Oatmeal");
    }
}
