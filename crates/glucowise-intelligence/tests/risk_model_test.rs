// ABOUTME: Tests for diabetes-risk feature encoding and forest classifier inference
// ABOUTME: Pins the column layout and loads a small forest artifact from a temp file
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 GlucoWise Contributors
#![allow(clippy::unwrap_used, clippy::float_cmp, clippy::panic)]

use std::io::Write;
use std::sync::Arc;

use glucowise_core::{
    models::{Jurisdiction, Race, Sex, SmokingHistory},
    AppLogger, DomainError,
};
use glucowise_intelligence::{
    encode, encode_raw, BinaryClassifier, ForestModel, ModelError, RawRiskInput, RiskInput,
    RiskClassifierAdapter, RiskLabel, FEATURE_NAMES,
};
use serde_json::json;

fn ohio_male() -> RiskInput {
    RiskInput {
        sex: Sex::Male,
        age: 30,
        location: Jurisdiction::Ohio,
        race: Race::Asian,
        hypertension: false,
        heart_disease: false,
        smoking_history: SmokingHistory::Never,
        bmi: 22.86,
        hba1c: 5.4,
        blood_glucose: 95.0,
    }
}

/// One tree splitting on `hbA1c_level <= 6.5`, one on `blood_glucose_level <= 140`
fn forest_json() -> serde_json::Value {
    json!({
        "schema_version": 1,
        "feature_names": FEATURE_NAMES,
        "trees": [
            { "nodes": [
                { "feature": 13, "threshold": 6.5, "left": 1, "right": 2 },
                { "value": [0.9, 0.1] },
                { "value": [0.2, 0.8] }
            ] },
            { "nodes": [
                { "feature": 14, "threshold": 140.0, "left": 1, "right": 2 },
                { "value": [95.0, 5.0] },
                { "value": [10.0, 30.0] }
            ] }
        ]
    })
}

fn write_artifact(value: &serde_json::Value) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(value.to_string().as_bytes()).unwrap();
    file
}

// ============================================================================
// Encoder
// ============================================================================

#[test]
fn test_encoding_of_reference_profile() {
    let features = encode(&ohio_male());

    assert_eq!(
        features.as_slice(),
        &[
            2022.0, 1.0, 30.0, 36.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 4.0, 22.86, 5.4, 95.0
        ]
    );
    assert_eq!(features.get("location"), Some(36.0));
    assert_eq!(features.get("asian"), Some(1.0));
    assert_eq!(features.get("not_a_column"), None);
}

#[test]
fn test_smoking_codes_follow_training_order() {
    let expected = [
        (SmokingHistory::NotCurrent, 0.0),
        (SmokingHistory::Former, 1.0),
        (SmokingHistory::Current, 2.0),
        (SmokingHistory::NoInfo, 3.0),
        (SmokingHistory::Never, 4.0),
        (SmokingHistory::Ever, 5.0),
    ];
    for (history, code) in expected {
        let input = RiskInput {
            smoking_history: history,
            ..ohio_male()
        };
        assert_eq!(encode(&input).get("smoking_history"), Some(code));
    }
}

#[test]
fn test_raw_input_accepts_yes_no_and_case_insensitive_categories() {
    let raw: RawRiskInput = serde_json::from_value(json!({
        "sex": "female",
        "age": 52,
        "location": "new york",
        "race": "Hispanic",
        "hypertension": "Yes",
        "heart_disease": false,
        "smoking_history": "No Info",
        "bmi": 31.2,
        "hba1c": 6.8,
        "blood_glucose": 160
    }))
    .unwrap();

    let features = encode_raw(&raw).unwrap();
    assert_eq!(features.get("gender"), Some(0.0));
    assert_eq!(
        features.get("location"),
        Some(f64::from(Jurisdiction::NewYork.index()))
    );
    assert_eq!(features.get("hispanic"), Some(1.0));
    assert_eq!(features.get("hypertension"), Some(1.0));
    assert_eq!(features.get("heart_disease"), Some(0.0));
    assert_eq!(features.get("smoking_history"), Some(3.0));
}

#[test]
fn test_raw_input_reports_unknown_category() {
    let raw = RawRiskInput {
        sex: "Male".to_owned(),
        age: 30,
        location: "Atlantis".to_owned(),
        race: "Asian".to_owned(),
        hypertension: false,
        heart_disease: false,
        smoking_history: "never".to_owned(),
        bmi: 22.0,
        hba1c: 5.0,
        blood_glucose: 90.0,
    };

    match encode_raw(&raw) {
        Err(DomainError::UnknownCategory { field, value }) => {
            assert_eq!(field, "location");
            assert_eq!(value, "Atlantis");
        }
        other => panic!("expected UnknownCategory, got {other:?}"),
    }
}

// ============================================================================
// Forest artifact
// ============================================================================

#[test]
fn test_forest_loads_and_predicts() {
    let file = write_artifact(&forest_json());
    let model = ForestModel::load(file.path()).unwrap();

    let healthy = encode(&ohio_male());
    assert_eq!(model.predict(healthy.as_slice()).unwrap(), 0);

    let at_risk = encode(&RiskInput {
        hba1c: 7.2,
        blood_glucose: 180.0,
        ..ohio_male()
    });
    // (0.8 + 0.75) / 2
    assert!((model.predict_proba(at_risk.as_slice()).unwrap() - 0.775).abs() < 1e-9);
    assert_eq!(model.predict(at_risk.as_slice()).unwrap(), 1);
}

#[test]
fn test_forest_rejects_mismatched_columns() {
    let mut artifact = forest_json();
    artifact["feature_names"][0] = json!("calendar_year");

    let err = ForestModel::from_json(&artifact.to_string()).unwrap_err();
    assert!(matches!(err, DomainError::ModelArtifact(_)));
}

#[test]
fn test_forest_rejects_unknown_schema_version() {
    let mut artifact = forest_json();
    artifact["schema_version"] = json!(2);

    assert!(matches!(
        ForestModel::from_json(&artifact.to_string()),
        Err(DomainError::ModelArtifact(_))
    ));
}

#[test]
fn test_missing_artifact_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let err = ForestModel::load(dir.path().join("absent.json")).unwrap_err();
    assert!(err.to_string().contains("absent.json"));
}

#[test]
fn test_forest_rejects_non_finite_features() {
    let model = ForestModel::from_json(&forest_json().to_string()).unwrap();
    let mut row = encode(&ohio_male()).as_slice().to_vec();
    row[12] = f64::NAN;

    assert_eq!(model.predict(&row), Err(ModelError::NonFinite("bmi")));
}

// ============================================================================
// Adapter
// ============================================================================

#[test]
fn test_adapter_maps_codes_to_labels() {
    let model = ForestModel::from_json(&forest_json().to_string()).unwrap();
    let adapter = RiskClassifierAdapter::new(Arc::new(model), AppLogger::new("risk_test"));

    let negative = adapter.assess(&ohio_male()).unwrap();
    assert_eq!(negative.prediction, RiskLabel::No);
    assert_eq!(negative.prediction_code, 0);

    let positive = adapter
        .assess(&RiskInput {
            hba1c: 7.2,
            blood_glucose: 180.0,
            ..ohio_male()
        })
        .unwrap();
    assert_eq!(positive.prediction, RiskLabel::Yes);
    assert_eq!(positive.prediction_code, 1);

    let json = serde_json::to_value(positive).unwrap();
    assert_eq!(json, json!({"prediction": "yes", "prediction_code": 1}));
}
