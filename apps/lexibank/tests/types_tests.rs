//! Unit tests for API types serialization/deserialization.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use lexibank::api::{
    AddWordsRequest, AddWordsResponse, BankResponse, ErrorResponse, ExportResponse, GridQuery,
    HealthResponse, PlanResponse, ReviewRequest, ReviewResponse, StagesResponse, StatusResponse,
};
use lexibank_core::{
    BankId, Day, LexiError, NewWord, Recall, Stage, StageDistribution, StageFilter, StageProgress,
    TransitionPolicy, Word, WordBank, WordId,
};

// =============================================================================
// HEALTH & STATUS RESPONSE TESTS
// =============================================================================

#[test]
fn test_health_response_default() {
    let health = HealthResponse::default();
    assert_eq!(health.status, "ok");
    assert!(!health.version.is_empty());
}

#[test]
fn test_health_response_deserialization() {
    let json = r#"{"status":"healthy","version":"1.0.0"}"#;
    let health: HealthResponse = serde_json::from_str(json).unwrap();

    assert_eq!(health.status, "healthy");
    assert_eq!(health.version, "1.0.0");
}

#[test]
fn test_status_response_serialization() {
    let status = StatusResponse {
        bank_count: 2,
        word_count: 150,
        mastered_count: 12,
        course_count: 1,
        persistent: true,
    };

    let json = serde_json::to_string(&status).unwrap();
    assert!(json.contains("\"bank_count\":2"));
    assert!(json.contains("\"word_count\":150"));
    assert!(json.contains("\"mastered_count\":12"));
    assert!(json.contains("\"persistent\":true"));
}

#[test]
fn test_error_response_shape() {
    let json = serde_json::to_string(&ErrorResponse::new("Bank not found: 3")).unwrap();
    assert_eq!(json, r#"{"error":"Bank not found: 3"}"#);
}

// =============================================================================
// BANK & WORD TESTS
// =============================================================================

#[test]
fn test_bank_response_success_and_error() {
    let ok = BankResponse::success(WordBank::new(BankId(1), "Verbs", Day::new(20_000)));
    assert!(ok.success);
    assert!(ok.error.is_none());
    assert_eq!(ok.bank.unwrap().created, Day::new(20_000));

    let err = BankResponse::error("Bank already exists: Verbs");
    assert!(!err.success);
    assert!(err.bank.is_none());
}

#[test]
fn test_add_words_request_deserialization() {
    let json = r#"{"words":[{"term":"casa","meaning":"house"},{"term":"perro","meaning":"dog"}]}"#;
    let request: AddWordsRequest = serde_json::from_str(json).unwrap();

    assert_eq!(request.words.len(), 2);
    assert_eq!(request.words[1], NewWord::new("perro", "dog"));
    assert!(request.validate().is_ok());
}

#[test]
fn test_add_words_request_empty_rejected() {
    let request = AddWordsRequest { words: vec![] };
    assert!(matches!(request.validate(), Err(LexiError::InvalidWord(_))));
}

#[test]
fn test_add_words_response_ids_are_raw() {
    let response = AddWordsResponse::success(&[WordId(7), WordId(8)], vec!["casa".to_string()]);

    let json = serde_json::to_string(&response).unwrap();
    assert!(json.contains("\"added\":[7,8]"));
    assert!(json.contains("\"duplicates\":[\"casa\"]"));
}

// =============================================================================
// REVIEW TESTS
// =============================================================================

#[test]
fn test_review_request_defaults_to_grid_policy() {
    let json = r#"{"results":[{"word_id":1,"correct":true},{"word_id":2,"correct":false}]}"#;
    let request: ReviewRequest = serde_json::from_str(json).unwrap();

    assert_eq!(request.policy().unwrap(), TransitionPolicy::ResetOnMiss);
    assert!(request.day.is_none());
    assert_eq!(
        request.to_recalls().unwrap(),
        vec![(WordId(1), Recall::Correct), (WordId(2), Recall::Incorrect)]
    );
}

#[test]
fn test_review_request_anti_forgetting_mode() {
    let json = r#"{"mode":"anti-forgetting","results":[{"word_id":4,"correct":false}],"day":99}"#;
    let request: ReviewRequest = serde_json::from_str(json).unwrap();

    assert_eq!(request.policy().unwrap(), TransitionPolicy::StepBackOnMiss);
    assert_eq!(request.day, Some(99));
}

#[test]
fn test_review_request_without_results_rejected() {
    let request = ReviewRequest {
        mode: None,
        results: vec![],
        day: None,
    };
    assert!(request.to_recalls().is_err());
}

#[test]
fn test_review_response_error_has_no_distribution() {
    let response = ReviewResponse::error("Word not found");
    assert!(!response.success);
    assert!(response.changes.is_empty());
    assert!(response.distribution.is_none());
}

// =============================================================================
// STAGES & GRID TESTS
// =============================================================================

#[test]
fn test_stages_response_from_progress() {
    let mut mastered = Word::new(WordId(2), "gato", "cat");
    mastered.stage = Stage::MASTERED;
    let words = vec![Word::new(WordId(1), "casa", "house"), mastered];
    let progress = StageProgress::from_distribution(StageDistribution::from_words(&words));

    let response = StagesResponse::from(&progress);

    assert_eq!(response.stages.len(), 9);
    assert_eq!(response.stages[0].stage, 1);
    assert_eq!(response.stages[0].count, 1);
    assert_eq!(response.stages[8].count, 1);
    assert_eq!(response.total, 2);
    assert_eq!(response.mastered, 1);
    assert_eq!(response.mastered_percent, 50);
    assert_eq!(response.lowest_stage, Some(1));
    assert!(!response.complete);
}

#[test]
fn test_grid_query_filters() {
    let default = GridQuery::default();
    assert_eq!(default.filter().unwrap(), StageFilter::Unmastered);

    let all = GridQuery {
        all: true,
        ..GridQuery::default()
    };
    assert_eq!(all.filter().unwrap(), StageFilter::All);

    let only = GridQuery {
        stage: Some(3),
        all: true,
        ..GridQuery::default()
    };
    assert_eq!(
        only.filter().unwrap(),
        StageFilter::Only(Stage::new(3).unwrap())
    );
}

#[test]
fn test_grid_query_out_of_range_stage() {
    let query = GridQuery {
        stage: Some(0),
        ..GridQuery::default()
    };
    assert!(matches!(query.filter(), Err(LexiError::InvalidStage(0))));
}

// =============================================================================
// COURSE & EXPORT TESTS
// =============================================================================

#[test]
fn test_plan_response_omits_words_without_day() {
    let json = r#"{"plan":{"course":1,"days":[]}}"#;
    let response: PlanResponse = serde_json::from_str(json).unwrap();
    assert!(response.words.is_none());

    let out = serde_json::to_string(&response).unwrap();
    assert!(!out.contains("words"));
}

#[test]
fn test_export_response_success_is_base64() {
    let response = ExportResponse::success(vec![1, 2, 3, 4], "ab".repeat(32));

    assert!(response.success);
    assert_eq!(response.data.as_deref(), Some("AQIDBA=="));
    assert_eq!(response.checksum.unwrap().len(), 64);
}

#[test]
fn test_export_response_error() {
    let response = ExportResponse::error("Export failed");
    assert!(!response.success);
    assert!(response.data.is_none());
    assert!(response.checksum.is_none());
}
