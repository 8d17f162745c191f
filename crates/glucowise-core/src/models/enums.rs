// ABOUTME: Closed categorical enumerations (sex, activity, goal, race, smoking, jurisdiction, BMI class)
// ABOUTME: Generated with one macro so parsing, display, and serde share a single wire-string table
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 GlucoWise Contributors

use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::DomainError;

/// Declares a closed enum whose variants map to fixed wire strings.
///
/// Parsing is case-insensitive and ignores surrounding whitespace; extra accepted
/// spellings are listed after `|`. Serialization always emits the canonical string.
macro_rules! closed_enum {
    (
        $(#[$meta:meta])*
        $name:ident, field = $field:literal {
            $(
                $(#[$vmeta:meta])*
                $variant:ident => $wire:literal $(| $alias:literal)*
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// Every variant, in declaration order
            pub const ALL: &'static [Self] = &[ $( Self::$variant ),+ ];

            /// Field name reported when parsing fails
            pub const FIELD: &'static str = $field;

            /// Canonical wire string
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $( Self::$variant => $wire ),+
                }
            }
        }

        impl FromStr for $name {
            type Err = DomainError;

            fn from_str(raw: &str) -> Result<Self, Self::Err> {
                let value = raw.trim();
                $(
                    if value.eq_ignore_ascii_case($wire)
                        $( || value.eq_ignore_ascii_case($alias) )*
                    {
                        return Ok(Self::$variant);
                    }
                )+
                Err(DomainError::unknown_category($field, raw))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(de::Error::custom)
            }
        }
    };
}

closed_enum! {
    /// Biological sex as recorded in the profile
    Sex, field = "sex" {
        /// Male
        Male => "Male",
        /// Female
        Female => "Female",
        /// Other or undisclosed
        Other => "Other",
    }
}

closed_enum! {
    /// Habitual activity level used to scale BMR into TDEE
    ActivityLevel, field = "activity_level" {
        /// Little or no exercise
        Sedentary => "Sedentary",
        /// Light exercise 1-3 days a week
        LightlyActive => "Lightly Active" | "lightly_active",
        /// Moderate exercise 3-5 days a week
        ModeratelyActive => "Moderately Active" | "moderately_active",
        /// Hard exercise 6-7 days a week
        VeryActive => "Very Active" | "very_active",
        /// Physical job or twice-daily training
        ExtraActive => "Extra Active" | "extra_active",
    }
}

closed_enum! {
    /// Nutrition goal that selects the macro split
    Goal, field = "goal" {
        /// Caloric deficit, higher protein
        LoseWeight => "lose weight" | "lose" | "lose_weight",
        /// Maintenance
        Maintain => "maintain" | "maintain weight",
        /// Caloric surplus, highest protein
        GainMuscle => "gain muscle" | "gain" | "gain_muscle",
    }
}

closed_enum! {
    /// Race category, one-hot encoded for the risk classifier
    Race, field = "race" {
        /// African American
        AfricanAmerican => "AfricanAmerican" | "African American" | "African",
        /// Asian
        Asian => "Asian",
        /// Caucasian
        Caucasian => "Caucasian",
        /// Hispanic
        Hispanic => "Hispanic",
        /// Other
        Other => "Other",
    }
}

closed_enum! {
    /// Smoking history category
    SmokingHistory, field = "smoking_history" {
        /// Never smoked
        Never => "never",
        /// Smoked previously, not currently
        NotCurrent => "not current",
        /// Currently smokes
        Current => "current",
        /// Not reported
        NoInfo => "No Info",
        /// Has ever smoked
        Ever => "ever",
        /// Former smoker
        Former => "former",
    }
}

closed_enum! {
    /// BMI band with lower bounds 18.5, 25 and 30
    BmiClass, field = "bmi_class" {
        /// BMI below 18.5
        Underweight => "underweight",
        /// 18.5 <= BMI < 25
        Normal => "normal weight" | "normal",
        /// 25 <= BMI < 30
        Overweight => "overweight",
        /// BMI of 30 or more
        Obese => "obese",
    }
}

closed_enum! {
    /// US jurisdiction of residence.
    ///
    /// Declaration order is the classifier's location code and must not change.
    Jurisdiction, field = "location" {
        /// Alabama
        Alabama => "Alabama",
        /// Alaska
        Alaska => "Alaska",
        /// Arizona
        Arizona => "Arizona",
        /// Arkansas
        Arkansas => "Arkansas",
        /// California
        California => "California",
        /// Colorado
        Colorado => "Colorado",
        /// Connecticut
        Connecticut => "Connecticut",
        /// Delaware
        Delaware => "Delaware",
        /// District of Columbia
        DistrictOfColumbia => "District of Columbia",
        /// Florida
        Florida => "Florida",
        /// Georgia
        Georgia => "Georgia",
        /// Guam
        Guam => "Guam",
        /// Hawaii
        Hawaii => "Hawaii",
        /// Idaho
        Idaho => "Idaho",
        /// Illinois
        Illinois => "Illinois",
        /// Indiana
        Indiana => "Indiana",
        /// Iowa
        Iowa => "Iowa",
        /// Kansas
        Kansas => "Kansas",
        /// Kentucky
        Kentucky => "Kentucky",
        /// Louisiana
        Louisiana => "Louisiana",
        /// Maine
        Maine => "Maine",
        /// Maryland
        Maryland => "Maryland",
        /// Massachusetts
        Massachusetts => "Massachusetts",
        /// Michigan
        Michigan => "Michigan",
        /// Minnesota
        Minnesota => "Minnesota",
        /// Mississippi
        Mississippi => "Mississippi",
        /// Missouri
        Missouri => "Missouri",
        /// Montana
        Montana => "Montana",
        /// Nebraska
        Nebraska => "Nebraska",
        /// Nevada
        Nevada => "Nevada",
        /// New Hampshire
        NewHampshire => "New Hampshire",
        /// New Jersey
        NewJersey => "New Jersey",
        /// New Mexico
        NewMexico => "New Mexico",
        /// New York
        NewYork => "New York",
        /// North Carolina
        NorthCarolina => "North Carolina",
        /// North Dakota
        NorthDakota => "North Dakota",
        /// Ohio
        Ohio => "Ohio",
        /// Oklahoma
        Oklahoma => "Oklahoma",
        /// Oregon
        Oregon => "Oregon",
        /// Pennsylvania
        Pennsylvania => "Pennsylvania",
        /// Puerto Rico
        PuertoRico => "Puerto Rico",
        /// Rhode Island
        RhodeIsland => "Rhode Island",
        /// South Carolina
        SouthCarolina => "South Carolina",
        /// South Dakota
        SouthDakota => "South Dakota",
        /// Tennessee
        Tennessee => "Tennessee",
        /// Texas
        Texas => "Texas",
        /// National aggregate
        UnitedStates => "United States",
        /// Utah
        Utah => "Utah",
        /// Vermont
        Vermont => "Vermont",
        /// US Virgin Islands
        VirginIslands => "Virgin Islands",
        /// Virginia
        Virginia => "Virginia",
        /// Washington
        Washington => "Washington",
        /// West Virginia
        WestVirginia => "West Virginia",
        /// Wisconsin
        Wisconsin => "Wisconsin",
        /// Wyoming
        Wyoming => "Wyoming",
    }
}

impl Jurisdiction {
    /// Position in the fixed jurisdiction list
    #[must_use]
    pub const fn index(self) -> u8 {
        self as u8
    }
}
