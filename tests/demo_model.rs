use std::path::PathBuf;

use emra::adapters::JsonArtifactStore;
use emra::domain::{Direction, FEATURE_CODES};
use emra::{AssessmentReport, AssessmentService, BiomarkerInput, RiskCategory};

fn models_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("models")
}

fn service() -> AssessmentService {
    let store = JsonArtifactStore::open(models_dir(), true).expect("demo artifacts verify");
    assert!(store.is_verified());
    AssessmentService::from_source(&store).expect("demo artifacts load")
}

#[test]
fn demo_artifacts_are_consistent() {
    let service = service();
    assert_eq!(service.model().feature_names(), FEATURE_CODES.to_vec());
    assert_eq!(service.metadata().n_reference, Some(service.reference().len()));
    assert_eq!(service.metadata().model_name.as_deref(), Some("emra-logreg-demo"));
}

#[test]
fn healthy_profile_is_low_risk() {
    let assessment = service()
        .assess(&BiomarkerInput::default())
        .expect("in-range input");

    assert_eq!(assessment.percentile.value(), 20);
    assert_eq!(assessment.category, RiskCategory::LowRisk);
}

#[test]
fn adverse_profile_is_elevated_and_led_by_glycemia() {
    let assessment = service()
        .assess(&BiomarkerInput::new(160.0, 7.5, 300.0, 38.0))
        .expect("in-range input");

    assert_eq!(assessment.percentile.value(), 90);
    assert_eq!(assessment.category, RiskCategory::ElevatedRisk);
    assert!(assessment
        .contributions
        .iter()
        .all(|c| c.direction == Direction::Increase));
    // HbA1c sits 3.1 SD above the cohort mean with the largest weight
    assert_eq!(assessment.contributions[0].feature, "LBXGH");
}

#[test]
fn percentile_never_decreases_with_glucose() {
    let service = service();
    let mut previous = 0;
    for glucose in (50..=200).step_by(10) {
        let input = BiomarkerInput::new(f64::from(glucose), 5.7, 130.0, 28.0);
        let percentile = service.assess(&input).expect("in-range input").percentile.value();
        assert!(percentile >= previous, "{glucose}: {percentile} < {previous}");
        assert!((20..=90).contains(&percentile));
        previous = percentile;
    }
}

#[test]
fn report_round_trips_through_json() {
    let assessment = service()
        .assess(&BiomarkerInput::new(105.0, 5.8, 150.0, 29.0))
        .expect("in-range input");
    let report = AssessmentReport::from_assessment(&assessment);

    let listed: Vec<&str> = report.inputs.iter().map(|l| l.code.as_str()).collect();
    assert_eq!(listed, assessment.feature_order);

    let value: serde_json::Value =
        serde_json::from_str(&report.to_json().expect("serializable")).expect("valid JSON");
    assert_eq!(value["percentile"], u64::from(assessment.percentile.value()));
    assert_eq!(value["inputs"].as_array().map(Vec::len), Some(4));
    assert_eq!(value["contributions"].as_array().map(Vec::len), Some(4));

    let text = report.render_text();
    assert!(text.contains(report.label));
    assert!(text.contains("Fasting glucose (mg/dL)"));
}
