// ABOUTME: Typed health profile with every field the metrics and risk engine consume
// ABOUTME: Includes a Yes/No tolerant boolean codec used by stored user documents
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 GlucoWise Contributors

use serde::{Deserialize, Serialize};

use super::enums::{ActivityLevel, Goal, Jurisdiction, Race, Sex, SmokingHistory};

/// Complete physiological and demographic profile of one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Age in whole years
    pub age: u32,
    /// Biological sex
    pub sex: Sex,
    /// Height in centimeters
    #[serde(rename = "height")]
    pub height_cm: u32,
    /// Weight in kilograms
    #[serde(rename = "weight")]
    pub weight_kg: u32,
    /// Habitual activity level
    pub activity_level: ActivityLevel,
    /// Nutrition goal
    pub goal: Goal,
    /// Race category
    pub race: Race,
    /// Smoking history
    pub smoking_history: SmokingHistory,
    /// Jurisdiction of residence
    pub location: Jurisdiction,
    /// Diagnosed hypertension
    #[serde(with = "yes_no")]
    pub hypertension: bool,
    /// Diagnosed heart disease
    #[serde(with = "yes_no")]
    pub heart_disease: bool,
    /// Most recent `HbA1c` reading (percent)
    pub hba1c: f64,
    /// Most recent blood glucose reading (mg/dL)
    pub blood_glucose: f64,
}

/// The subset of a profile the body-metrics chain needs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BodyMeasurements {
    /// Age in whole years
    pub age: u32,
    /// Biological sex
    pub sex: Sex,
    /// Height in centimeters
    pub height_cm: u32,
    /// Weight in kilograms
    pub weight_kg: u32,
    /// Habitual activity level
    pub activity_level: ActivityLevel,
    /// Nutrition goal
    pub goal: Goal,
}

impl Profile {
    /// Body measurements for metric computation
    #[must_use]
    pub const fn body(&self) -> BodyMeasurements {
        BodyMeasurements {
            age: self.age,
            sex: self.sex,
            height_cm: self.height_cm,
            weight_kg: self.weight_kg,
            activity_level: self.activity_level,
            goal: self.goal,
        }
    }
}

/// Boolean codec accepting `true`/`false` as well as the legacy `"Yes"`/`"No"` strings.
///
/// Always serializes as a JSON boolean.
pub mod yes_no {
    use serde::{de, Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    /// Serialize as a plain boolean
    ///
    /// # Errors
    ///
    /// Returns the serializer's error
    #[allow(clippy::trivially_copy_pass_by_ref)]
    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bool(*value)
    }

    /// Deserialize from a boolean or a yes/no string
    ///
    /// # Errors
    ///
    /// Returns an error for strings other than yes/no/true/false
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        match Flag::deserialize(deserializer)? {
            Flag::Bool(value) => Ok(value),
            Flag::Text(text) => parse(&text)
                .ok_or_else(|| de::Error::custom(format!("expected Yes or No, got '{text}'"))),
        }
    }

    /// Parse a yes/no style flag
    #[must_use]
    pub fn parse(text: &str) -> Option<bool> {
        match text.trim().to_ascii_lowercase().as_str() {
            "yes" | "true" | "y" | "1" => Some(true),
            "no" | "false" | "n" | "0" => Some(false),
            _ => None,
        }
    }

    /// Optional variant for partially filled documents
    pub mod option {
        use serde::{Deserialize, Deserializer, Serializer};

        /// Serialize `Some(flag)` as a boolean and `None` as null
        ///
        /// # Errors
        ///
        /// Returns the serializer's error
        #[allow(clippy::ref_option)]
        pub fn serialize<S: Serializer>(
            value: &Option<bool>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(flag) => serializer.serialize_bool(*flag),
                None => serializer.serialize_none(),
            }
        }

        /// Deserialize an optional boolean or yes/no string
        ///
        /// # Errors
        ///
        /// Returns an error for strings other than yes/no/true/false
        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<bool>, D::Error> {
            #[derive(Deserialize)]
            struct Wrapper(#[serde(deserialize_with = "super::deserialize")] bool);

            Option::<Wrapper>::deserialize(deserializer).map(|flag| flag.map(|Wrapper(v)| v))
        }
    }
}
