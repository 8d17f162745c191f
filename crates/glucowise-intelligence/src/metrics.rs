// ABOUTME: Body-composition metrics chain: BMI and class, Harris-Benedict BMR, TDEE, and macro split
// ABOUTME: Pure deterministic functions plus a calculator that derives all metrics from body measurements
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 GlucoWise Contributors

//! Metrics Calculator
//!
//! - **BMI** = weight / (height/100)²; classes break at 18.5, 25 and 30, each band
//!   inclusive of its lower bound.
//! - **BMR** via the Harris-Benedict equation; `Sex::Female` and `Sex::Other` share
//!   the female coefficients.
//! - **TDEE** = BMR × activity multiplier.
//! - **Macros**: protein and carbohydrate grams = pct × kcal / 4, fat grams = pct × kcal / 9.
//!
//! Every function is side-effect free; the same inputs always produce the same output.

use glucowise_core::{
    errors::DomainError,
    models::{ActivityLevel, BmiClass, BodyMeasurements, Goal, Sex},
    AppLogger,
};
use serde::{Deserialize, Serialize};

use crate::config::{ActivityFactorsConfig, BmrConfig, MacroSplitConfig, MetricsConfig};

/// Energy density of protein and carbohydrate (kcal per gram)
pub const KCAL_PER_GRAM_PROTEIN: f64 = 4.0;
/// Energy density of carbohydrate (kcal per gram)
pub const KCAL_PER_GRAM_CARBS: f64 = 4.0;
/// Energy density of fat (kcal per gram)
pub const KCAL_PER_GRAM_FAT: f64 = 9.0;

/// BMI value with its band
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BmiReading {
    /// Body mass index (kg/m²)
    pub bmi: f64,
    /// Band the value falls in
    pub class: BmiClass,
}

/// Basal and total daily energy expenditure (kcal/day)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnergyExpenditure {
    /// Basal metabolic rate
    pub bmr: f64,
    /// Total daily energy expenditure
    pub tdee: f64,
}

/// Daily macronutrient targets in grams
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Macros {
    /// Protein grams
    pub protein: f64,
    /// Fat grams
    pub fat: f64,
    /// Carbohydrate grams
    pub carbs: f64,
}

impl Macros {
    /// Calories these grams represent at 4/9/4 kcal per gram
    #[must_use]
    pub fn calories(&self) -> f64 {
        self.protein.mul_add(
            KCAL_PER_GRAM_PROTEIN,
            self.fat
                .mul_add(KCAL_PER_GRAM_FAT, self.carbs * KCAL_PER_GRAM_CARBS),
        )
    }
}

/// Everything derived from a profile's body measurements
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetrics {
    /// Body mass index
    pub bmi: f64,
    /// BMI band
    pub bmi_class: BmiClass,
    /// Basal metabolic rate
    pub bmr: f64,
    /// Total daily energy expenditure
    pub tdee: f64,
    /// Macro targets computed from `tdee`
    pub macros: Macros,
}

/// Classify a BMI value
#[must_use]
pub fn classify_bmi(bmi: f64) -> BmiClass {
    if bmi < 18.5 {
        BmiClass::Underweight
    } else if bmi < 25.0 {
        BmiClass::Normal
    } else if bmi < 30.0 {
        BmiClass::Overweight
    } else {
        BmiClass::Obese
    }
}

fn require_positive(value: f64, what: &str) -> Result<(), DomainError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(DomainError::invalid_input(format!(
            "{what} must be a positive number, got {value}"
        )))
    }
}

/// Calculate body mass index and its band
///
/// # Errors
///
/// Returns `InvalidInput` if weight or height is not strictly positive
pub fn bmi(weight_kg: f64, height_cm: f64) -> Result<BmiReading, DomainError> {
    require_positive(weight_kg, "Weight")?;
    require_positive(height_cm, "Height")?;

    let height_m = height_cm / 100.0;
    let bmi = weight_kg / (height_m * height_m);
    Ok(BmiReading {
        bmi,
        class: classify_bmi(bmi),
    })
}

/// Calculate Harris-Benedict BMR
///
/// # Errors
///
/// Returns `InvalidInput` if weight or height is not strictly positive
pub fn bmr(
    sex: Sex,
    weight_kg: f64,
    height_cm: f64,
    age_years: u32,
    config: &BmrConfig,
) -> Result<f64, DomainError> {
    require_positive(weight_kg, "Weight")?;
    require_positive(height_cm, "Height")?;

    let c = config.coefficients(sex);
    let age = f64::from(age_years);
    Ok(c.weight.mul_add(weight_kg, c.constant) + c.height.mul_add(height_cm, -(c.age * age)))
}

/// Calculate BMR and TDEE
///
/// # Errors
///
/// Returns `InvalidInput` if weight or height is not strictly positive
pub fn energy(
    sex: Sex,
    weight_kg: f64,
    height_cm: f64,
    age_years: u32,
    activity_level: ActivityLevel,
    bmr_config: &BmrConfig,
    activity_factors: &ActivityFactorsConfig,
) -> Result<EnergyExpenditure, DomainError> {
    let bmr = bmr(sex, weight_kg, height_cm, age_years, bmr_config)?;
    Ok(EnergyExpenditure {
        bmr,
        tdee: bmr * activity_factors.multiplier(activity_level),
    })
}

/// Split a calorie target into macronutrient grams
///
/// # Errors
///
/// Returns `InvalidInput` if calories are negative or not finite
pub fn macros(goal: Goal, calories: f64, config: &MacroSplitConfig) -> Result<Macros, DomainError> {
    if !calories.is_finite() || calories < 0.0 {
        return Err(DomainError::invalid_input(format!(
            "Calories must be a non-negative number, got {calories}"
        )));
    }

    let split = config.split(goal);
    let share = |pct: u8| f64::from(pct) / 100.0 * calories;
    Ok(Macros {
        protein: share(split.protein_pct) / KCAL_PER_GRAM_PROTEIN,
        fat: share(split.fat_pct) / KCAL_PER_GRAM_FAT,
        carbs: share(split.carbs_pct()) / KCAL_PER_GRAM_CARBS,
    })
}

/// Derives the full metric set for a set of body measurements
#[derive(Debug, Clone)]
pub struct MetricsCalculator {
    config: MetricsConfig,
    logger: AppLogger,
}

impl MetricsCalculator {
    /// Create a calculator with the given tables
    #[must_use]
    pub const fn new(config: MetricsConfig, logger: AppLogger) -> Self {
        Self { config, logger }
    }

    /// Tables in use
    #[must_use]
    pub const fn config(&self) -> &MetricsConfig {
        &self.config
    }

    /// BMI for a body
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for a zero height or weight
    pub fn bmi_for(&self, body: &BodyMeasurements) -> Result<BmiReading, DomainError> {
        bmi(f64::from(body.weight_kg), f64::from(body.height_cm))
    }

    /// BMR and TDEE for a body
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for a zero height or weight
    pub fn energy_for(&self, body: &BodyMeasurements) -> Result<EnergyExpenditure, DomainError> {
        energy(
            body.sex,
            f64::from(body.weight_kg),
            f64::from(body.height_cm),
            body.age,
            body.activity_level,
            &self.config.bmr,
            &self.config.activity_factors,
        )
    }

    /// BMI, BMR, TDEE, and macros (from TDEE) for a body
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for a zero height or weight
    pub fn derive(&self, body: &BodyMeasurements) -> Result<DerivedMetrics, DomainError> {
        let reading = self.bmi_for(body)?;
        let energy = self.energy_for(body)?;
        let macros = macros(body.goal, energy.tdee, &self.config.macros)?;

        tracing::debug!(
            parent: self.logger.span(),
            bmi = reading.bmi,
            bmi_class = %reading.class,
            bmr = energy.bmr,
            tdee = energy.tdee,
            "Derived body metrics"
        );

        Ok(DerivedMetrics {
            bmi: reading.bmi,
            bmi_class: reading.class,
            bmr: energy.bmr,
            tdee: energy.tdee,
            macros,
        })
    }
}
