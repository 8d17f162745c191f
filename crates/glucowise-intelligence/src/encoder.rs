// ABOUTME: Diabetes-risk feature encoder mapping profile fields onto the classifier's fixed 15-column vector
// ABOUTME: Column order and category codes are a versioned interface shared with the training pipeline
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 GlucoWise Contributors

//! # Risk Feature Encoder
//!
//! Column layout (schema version [`FEATURE_SCHEMA_VERSION`]):
//!
//! | # | column | encoding |
//! |---|--------|----------|
//! | 0 | `year` | constant 2022 |
//! | 1 | `gender` | Female 0, Male 1, Other 2 |
//! | 2 | `age` | years |
//! | 3 | `location` | index into the jurisdiction list |
//! | 4-8 | `africanamerican`..`other` | one-hot, exactly one column is 1 |
//! | 9 | `hypertension` | 0/1 |
//! | 10 | `heart_disease` | 0/1 |
//! | 11 | `smoking_history` | not current 0, former 1, current 2, No Info 3, never 4, ever 5 |
//! | 12 | `bmi` | raw |
//! | 13 | `hbA1c_level` | raw |
//! | 14 | `blood_glucose_level` | raw |
//!
//! No scaling is applied. Categorical codes come from exhaustive matches over the
//! closed enums, so a typed [`RiskInput`] always encodes; raw strings go through
//! [`RawRiskInput::parse`] which reports `UnknownCategory`.

use glucowise_core::{
    errors::DomainError,
    models::{yes_no, Jurisdiction, Profile, Race, Sex, SmokingHistory},
};
use serde::{Deserialize, Serialize};

/// Version of the column layout below
pub const FEATURE_SCHEMA_VERSION: u32 = 1;

/// Number of columns in a feature vector
pub const FEATURE_COUNT: usize = 15;

/// Data-collection year the classifier was trained on
pub const REFERENCE_YEAR: f64 = 2022.0;

/// Column names in vector order, as exported by the training pipeline
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "year",
    "gender",
    "age",
    "location",
    "africanamerican",
    "asian",
    "caucasian",
    "hispanic",
    "other",
    "hypertension",
    "heart_disease",
    "smoking_history",
    "bmi",
    "hbA1c_level",
    "blood_glucose_level",
];

/// Fixed-width numeric input to the risk classifier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    /// Columns in schema order
    #[must_use]
    pub const fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Value of one named column
    #[must_use]
    pub fn get(&self, name: &str) -> Option<f64> {
        FEATURE_NAMES
            .iter()
            .position(|candidate| *candidate == name)
            .map(|index| self.0[index])
    }
}

/// Typed classifier input
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskInput {
    /// Sex
    pub sex: Sex,
    /// Age in years
    pub age: u32,
    /// Jurisdiction of residence
    pub location: Jurisdiction,
    /// Race category
    pub race: Race,
    /// Diagnosed hypertension
    pub hypertension: bool,
    /// Diagnosed heart disease
    pub heart_disease: bool,
    /// Smoking history
    pub smoking_history: SmokingHistory,
    /// Body mass index
    pub bmi: f64,
    /// `HbA1c` percent
    pub hba1c: f64,
    /// Blood glucose mg/dL
    pub blood_glucose: f64,
}

impl RiskInput {
    /// Assemble classifier input from a profile and a freshly computed BMI
    #[must_use]
    pub const fn from_profile(profile: &Profile, bmi: f64) -> Self {
        Self {
            sex: profile.sex,
            age: profile.age,
            location: profile.location,
            race: profile.race,
            hypertension: profile.hypertension,
            heart_disease: profile.heart_disease,
            smoking_history: profile.smoking_history,
            bmi,
            hba1c: profile.hba1c,
            blood_glucose: profile.blood_glucose,
        }
    }
}

/// Classifier input as it arrives from untyped sources
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRiskInput {
    /// Sex string
    pub sex: String,
    /// Age in years
    pub age: u32,
    /// Jurisdiction name
    pub location: String,
    /// Race string
    pub race: String,
    /// Yes/No or boolean
    #[serde(with = "yes_no")]
    pub hypertension: bool,
    /// Yes/No or boolean
    #[serde(with = "yes_no")]
    pub heart_disease: bool,
    /// Smoking history string
    pub smoking_history: String,
    /// Body mass index
    pub bmi: f64,
    /// `HbA1c` percent
    pub hba1c: f64,
    /// Blood glucose mg/dL
    pub blood_glucose: f64,
}

impl RawRiskInput {
    /// Parse every categorical field
    ///
    /// # Errors
    ///
    /// Returns `UnknownCategory` naming the first field that does not match its enumeration
    pub fn parse(&self) -> Result<RiskInput, DomainError> {
        Ok(RiskInput {
            sex: self.sex.parse()?,
            age: self.age,
            location: self.location.parse()?,
            race: self.race.parse()?,
            hypertension: self.hypertension,
            heart_disease: self.heart_disease,
            smoking_history: self.smoking_history.parse()?,
            bmi: self.bmi,
            hba1c: self.hba1c,
            blood_glucose: self.blood_glucose,
        })
    }
}

/// Training-time code for sex
#[must_use]
pub const fn gender_code(sex: Sex) -> u8 {
    match sex {
        Sex::Female => 0,
        Sex::Male => 1,
        Sex::Other => 2,
    }
}

/// Training-time code for smoking history
#[must_use]
pub const fn smoking_code(history: SmokingHistory) -> u8 {
    match history {
        SmokingHistory::NotCurrent => 0,
        SmokingHistory::Former => 1,
        SmokingHistory::Current => 2,
        SmokingHistory::NoInfo => 3,
        SmokingHistory::Never => 4,
        SmokingHistory::Ever => 5,
    }
}

/// Column offset of the race one-hot block
const RACE_OFFSET: usize = 4;

const fn race_column(race: Race) -> usize {
    RACE_OFFSET
        + match race {
            Race::AfricanAmerican => 0,
            Race::Asian => 1,
            Race::Caucasian => 2,
            Race::Hispanic => 3,
            Race::Other => 4,
        }
}

const fn flag(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

/// Encode typed input into the classifier's feature vector
#[must_use]
pub fn encode(input: &RiskInput) -> FeatureVector {
    let mut columns = [0.0; FEATURE_COUNT];
    columns[0] = REFERENCE_YEAR;
    columns[1] = f64::from(gender_code(input.sex));
    columns[2] = f64::from(input.age);
    columns[3] = f64::from(input.location.index());
    columns[race_column(input.race)] = 1.0;
    columns[9] = flag(input.hypertension);
    columns[10] = flag(input.heart_disease);
    columns[11] = f64::from(smoking_code(input.smoking_history));
    columns[12] = input.bmi;
    columns[13] = input.hba1c;
    columns[14] = input.blood_glucose;
    FeatureVector(columns)
}

/// Parse and encode untyped input
///
/// # Errors
///
/// Returns `UnknownCategory` for an unrecognized sex, race, smoking history, or location
pub fn encode_raw(input: &RawRiskInput) -> Result<FeatureVector, DomainError> {
    input.parse().map(|typed| encode(&typed))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RiskInput {
        RiskInput {
            sex: Sex::Female,
            age: 45,
            location: Jurisdiction::Alabama,
            race: Race::Asian,
            hypertension: false,
            heart_disease: true,
            smoking_history: SmokingHistory::Never,
            bmi: 27.3,
            hba1c: 6.2,
            blood_glucose: 140.0,
        }
    }

    #[test]
    fn test_race_one_hot_sets_exactly_one_column() {
        for race in Race::ALL {
            let vector = encode(&RiskInput {
                race: *race,
                ..sample()
            });
            let hot: f64 = vector.as_slice()[RACE_OFFSET..RACE_OFFSET + 5].iter().sum();
            assert!((hot - 1.0).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn test_feature_names_match_column_count() {
        assert_eq!(FEATURE_NAMES.len(), FEATURE_COUNT);
        let vector = encode(&sample());
        assert_eq!(vector.get("asian"), Some(1.0));
        assert_eq!(vector.get("heart_disease"), Some(1.0));
        assert_eq!(vector.get("not_a_column"), None);
    }
}
