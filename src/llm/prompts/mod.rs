// ABOUTME: Prompt templates and response schemas for every language model task
// ABOUTME: The chat system prompt is loaded at compile time from a markdown file
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 GlucoWise Contributors

//! # Prompts
//!
//! Each structured task pairs a prompt builder with a response schema in Gemini's
//! OpenAPI subset. Every schema is an `ARRAY` of objects whose properties match the
//! records in [`crate::models`].

use glucowise_core::models::{BodyMeasurements, Profile};
use glucowise_intelligence::DerivedMetrics;
use serde_json::{json, Map, Value};

/// Chat assistant system prompt
pub const GLUCOWISE_SYSTEM_PROMPT: &str = include_str!("glucowise_system.md");

/// Default preferences when a plan request names none
pub const DEFAULT_PREFERENCES: &str = "no specific preferences";

/// System prompt used for every chat conversation
#[must_use]
pub const fn chat_system_prompt() -> &'static str {
    GLUCOWISE_SYSTEM_PROMPT
}

// ============================================================================
// Prompt Builders
// ============================================================================

/// Diet plan request
#[must_use]
pub fn diet_plan_prompt(
    profile: &Profile,
    metrics: &DerivedMetrics,
    preferences: &str,
    vegan: bool,
) -> String {
    format!(
        "Create a diabetes-friendly diet plan with the preferences: {preferences} and vegan: {vegan}\n\
         for a {age}yo {race} {sex}\n\
         with a BMI of {bmi:.1} and goal: {goal}.\n\
         TDEE: {tdee:.0} cal, BMR: {bmr:.0} cal.\n\
         Return a list of DietPlan objects with mealtime, foodItem, calories, protein, carbs, and fat.",
        age = profile.age,
        race = profile.race,
        sex = profile.sex,
        bmi = metrics.bmi,
        goal = profile.goal,
        tdee = metrics.tdee,
        bmr = metrics.bmr,
    )
}

/// Health advice request
#[must_use]
pub fn health_advice_prompt(body: &BodyMeasurements, metrics: &DerivedMetrics) -> String {
    format!(
        "Provide comprehensive diabetes-friendly health advice for:\n\
         - {age} year old {sex}\n\
         - Height: {height}cm, Weight: {weight}kg\n\
         - Activity: {activity}\n\
         - Goal: {goal}\n\
         - BMI: {bmi:.1} ({bmi_class})\n\
         - BMR: {bmr:.0}, TDEE: {tdee:.0}\n\
         Return a HealthAdvice object with general_recommendations, exercise_suggestions, \
         dietary_advice, health_risks, and lifestyle_tips.",
        age = body.age,
        sex = body.sex,
        height = body.height_cm,
        weight = body.weight_kg,
        activity = body.activity_level,
        goal = body.goal,
        bmi = metrics.bmi,
        bmi_class = metrics.bmi_class,
        bmr = metrics.bmr,
        tdee = metrics.tdee,
    )
}

/// Recipe request for a recognized food
#[must_use]
pub fn recipe_prompt(food_name: &str) -> String {
    format!(
        "Generate a diabetes-friendly recipe with {food_name}.\n\
         Return a Recipe object with recipeName, calories, protein, fats, carbs, and ingredients."
    )
}

/// Macro breakdown request
#[must_use]
pub fn macro_breakdown_prompt(food_item: &str) -> String {
    format!(
        "Return the macro breakdown of {food_item}.\n\
         Return a list of MacroBreakdown objects with nutrient and amount."
    )
}

// ============================================================================
// Response Schemas
// ============================================================================

/// `ARRAY` of `OBJECT` with the given required properties
fn array_of_objects(properties: &[(&str, &str)]) -> Value {
    let props: Map<String, Value> = properties
        .iter()
        .map(|(name, kind)| ((*name).to_owned(), json!({ "type": kind })))
        .collect();
    let required: Vec<&str> = properties.iter().map(|(name, _)| *name).collect();

    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": props,
            "required": required,
        }
    })
}

/// Schema for a list of [`crate::models::DietPlanEntry`]
#[must_use]
pub fn diet_plan_schema() -> Value {
    array_of_objects(&[
        ("mealtime", "STRING"),
        ("foodItem", "STRING"),
        ("calories", "INTEGER"),
        ("protein", "INTEGER"),
        ("carbs", "INTEGER"),
        ("fat", "INTEGER"),
    ])
}

/// Schema for a list of [`crate::models::Recipe`]
#[must_use]
pub fn recipe_schema() -> Value {
    array_of_objects(&[
        ("recipeName", "STRING"),
        ("calories", "INTEGER"),
        ("protein", "INTEGER"),
        ("fats", "INTEGER"),
        ("carbs", "INTEGER"),
        ("ingredients", "STRING"),
    ])
}

/// Schema for a list of [`crate::models::MacroBreakdown`]
#[must_use]
pub fn macro_breakdown_schema() -> Value {
    array_of_objects(&[("nutrient", "STRING"), ("amount", "STRING")])
}

/// Schema for a list of [`crate::models::HealthAdvice`]
#[must_use]
pub fn health_advice_schema() -> Value {
    array_of_objects(&[
        ("general_recommendations", "STRING"),
        ("exercise_suggestions", "STRING"),
        ("dietary_advice", "STRING"),
        ("health_risks", "STRING"),
        ("lifestyle_tips", "STRING"),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use glucowise_core::models::{
        ActivityLevel, BmiClass, Goal, Jurisdiction, Race, Sex, SmokingHistory,
    };
    use glucowise_intelligence::Macros;

    fn profile() -> Profile {
        Profile {
            age: 30,
            sex: Sex::Male,
            height_cm: 175,
            weight_kg: 70,
            activity_level: ActivityLevel::Sedentary,
            goal: Goal::Maintain,
            race: Race::Asian,
            smoking_history: SmokingHistory::Never,
            location: Jurisdiction::Ohio,
            hypertension: false,
            heart_disease: false,
            hba1c: 5.4,
            blood_glucose: 95.0,
        }
    }

    fn metrics() -> DerivedMetrics {
        DerivedMetrics {
            bmi: 22.857,
            bmi_class: BmiClass::Normal,
            bmr: 1695.67,
            tdee: 2034.8,
            macros: Macros {
                protein: 127.2,
                fat: 67.8,
                carbs: 228.9,
            },
        }
    }

    #[test]
    fn test_diet_plan_prompt_includes_profile_and_energy() {
        let prompt = diet_plan_prompt(&profile(), &metrics(), "low sodium", true);
        assert!(prompt.contains("preferences: low sodium and vegan: true"));
        assert!(prompt.contains("30yo Asian Male"));
        assert!(prompt.contains("BMI of 22.9"));
        assert!(prompt.contains("TDEE: 2035 cal, BMR: 1696 cal"));
    }

    #[test]
    fn test_health_advice_prompt_uses_bmi_band() {
        let prompt = health_advice_prompt(&profile().body(), &metrics());
        assert!(prompt.contains("BMI: 22.9 (normal weight)"));
        assert!(prompt.contains("Height: 175cm, Weight: 70kg"));
    }

    #[test]
    fn test_schemas_require_every_property() {
        let schema = diet_plan_schema();
        assert_eq!(schema["type"], "ARRAY");
        assert_eq!(schema["items"]["required"].as_array().unwrap().len(), 6);
        assert_eq!(recipe_schema()["items"]["properties"]["fats"]["type"], "INTEGER");
    }
}
