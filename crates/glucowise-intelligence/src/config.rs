// ABOUTME: Coefficient tables for body metrics: Harris-Benedict BMR, activity multipliers, macro splits
// ABOUTME: Defaults reproduce the published formulas; the tables are data so tests can pin them
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 GlucoWise Contributors

use glucowise_core::models::{ActivityLevel, Goal, Sex};
use serde::{Deserialize, Serialize};

/// Harris-Benedict BMR coefficients (revised 1984 form) for one sex
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HarrisBenedictCoefficients {
    /// Constant term (kcal)
    pub constant: f64,
    /// Per-kilogram coefficient
    pub weight: f64,
    /// Per-centimeter coefficient
    pub height: f64,
    /// Per-year coefficient (subtracted)
    pub age: f64,
}

/// BMR formula configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BmrConfig {
    /// Coefficients for `Sex::Male`
    pub male: HarrisBenedictCoefficients,
    /// Coefficients for `Sex::Female` and `Sex::Other`
    pub female: HarrisBenedictCoefficients,
}

impl BmrConfig {
    /// Coefficients applied to a given sex
    #[must_use]
    pub const fn coefficients(&self, sex: Sex) -> &HarrisBenedictCoefficients {
        match sex {
            Sex::Male => &self.male,
            Sex::Female | Sex::Other => &self.female,
        }
    }
}

impl Default for BmrConfig {
    fn default() -> Self {
        Self {
            male: HarrisBenedictCoefficients {
                constant: 88.362,
                weight: 13.397,
                height: 4.799,
                age: 5.677,
            },
            female: HarrisBenedictCoefficients {
                constant: 447.593,
                weight: 9.247,
                height: 3.100,
                age: 4.330,
            },
        }
    }
}

/// Activity factor multipliers for TDEE calculation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActivityFactorsConfig {
    /// Sedentary (little/no exercise): 1.2
    pub sedentary: f64,
    /// Lightly active (1-3 days/week): 1.375
    pub lightly_active: f64,
    /// Moderately active (3-5 days/week): 1.55
    pub moderately_active: f64,
    /// Very active (6-7 days/week): 1.725
    pub very_active: f64,
    /// Extra active (physical job or 2x/day training): 1.9
    pub extra_active: f64,
}

impl ActivityFactorsConfig {
    /// Multiplier for an activity level
    #[must_use]
    pub const fn multiplier(&self, level: ActivityLevel) -> f64 {
        match level {
            ActivityLevel::Sedentary => self.sedentary,
            ActivityLevel::LightlyActive => self.lightly_active,
            ActivityLevel::ModeratelyActive => self.moderately_active,
            ActivityLevel::VeryActive => self.very_active,
            ActivityLevel::ExtraActive => self.extra_active,
        }
    }
}

impl Default for ActivityFactorsConfig {
    fn default() -> Self {
        Self {
            sedentary: 1.2,
            lightly_active: 1.375,
            moderately_active: 1.55,
            very_active: 1.725,
            extra_active: 1.9,
        }
    }
}

/// Protein and fat share of calories in percent; carbohydrates take the remainder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacroSplit {
    /// Protein percentage
    pub protein_pct: u8,
    /// Fat percentage
    pub fat_pct: u8,
}

impl MacroSplit {
    /// Carbohydrate percentage (remainder to 100)
    #[must_use]
    pub const fn carbs_pct(&self) -> u8 {
        100_u8.saturating_sub(self.protein_pct.saturating_add(self.fat_pct))
    }
}

/// Macro split per goal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacroSplitConfig {
    /// Split for `Goal::LoseWeight` (30/25/45)
    pub lose_weight: MacroSplit,
    /// Split for `Goal::Maintain` (25/30/45)
    pub maintain: MacroSplit,
    /// Split for `Goal::GainMuscle` (35/20/45)
    pub gain_muscle: MacroSplit,
}

impl MacroSplitConfig {
    /// Split for a goal
    #[must_use]
    pub const fn split(&self, goal: Goal) -> MacroSplit {
        match goal {
            Goal::LoseWeight => self.lose_weight,
            Goal::Maintain => self.maintain,
            Goal::GainMuscle => self.gain_muscle,
        }
    }
}

impl Default for MacroSplitConfig {
    fn default() -> Self {
        Self {
            lose_weight: MacroSplit {
                protein_pct: 30,
                fat_pct: 25,
            },
            maintain: MacroSplit {
                protein_pct: 25,
                fat_pct: 30,
            },
            gain_muscle: MacroSplit {
                protein_pct: 35,
                fat_pct: 20,
            },
        }
    }
}

/// All tables used by the metrics calculator
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// BMR coefficients
    pub bmr: BmrConfig,
    /// Activity multipliers
    pub activity_factors: ActivityFactorsConfig,
    /// Macro splits
    pub macros: MacroSplitConfig,
}
