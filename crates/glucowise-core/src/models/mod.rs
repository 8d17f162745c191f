// ABOUTME: Closed enumerations for every categorical health field and the typed Profile record
// ABOUTME: Wire strings are part of the client contract and of the classifier's training-time encoding
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 GlucoWise Contributors

//! # Health Models
//!
//! Every categorical field is a closed enum. Parsing is the only place an
//! unrecognized string can appear, and it fails with
//! [`DomainError::UnknownCategory`](crate::errors::DomainError::UnknownCategory).
//! Matching on the variants is exhaustive everywhere else.

mod enums;
mod profile;

pub use enums::{ActivityLevel, BmiClass, Goal, Jurisdiction, Race, Sex, SmokingHistory};
pub use profile::{yes_no, BodyMeasurements, Profile};
