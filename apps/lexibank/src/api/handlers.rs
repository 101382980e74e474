//! # API Endpoint Handlers
//!
//! This module implements the actual HTTP endpoint handlers.
//!
//! Read endpoints answer with the payload or an [`ErrorResponse`].
//! Write endpoints always answer with a `success`/`error` envelope.

use super::{
    AppState,
    types::{
        AddWordsRequest, AddWordsResponse, BankResponse, BankSummary, CourseResponse,
        CreateBankRequest, CreateCourseRequest, DayQuery, DueResponse, ErrorResponse,
        ExportResponse, GridQuery, GridResponse, HashResponse, HealthResponse, PlanResponse,
        ReviewRequest, ReviewResponse, StagesResponse, StatusResponse, WordsResponse,
    },
};
use crate::current_day;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use lexibank_core::{
    BankId, Course, CourseId, Day, LexiError, NewCourse, snapshot_checksum, snapshot_to_bytes,
};

type ApiError = (StatusCode, Json<ErrorResponse>);

/// HTTP status for a core error.
pub fn status_for(error: &LexiError) -> StatusCode {
    match error {
        LexiError::BankNotFound(_) | LexiError::WordNotFound(_) | LexiError::CourseNotFound(_) => {
            StatusCode::NOT_FOUND
        }
        LexiError::DuplicateBank(_) => StatusCode::CONFLICT,
        LexiError::ValueTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        LexiError::InvalidWord(_)
        | LexiError::InvalidName(_)
        | LexiError::InvalidStage(_)
        | LexiError::InvalidChunkSize(_)
        | LexiError::InvalidConfig(_) => StatusCode::BAD_REQUEST,
        LexiError::CorruptedChunk { .. }
        | LexiError::SerializationError(_)
        | LexiError::IoError(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn api_error(error: LexiError) -> ApiError {
    let status = status_for(&error);
    if status.is_server_error() {
        tracing::error!(error = %error, "request failed");
    }
    (status, Json(ErrorResponse::new(error.to_string())))
}

fn day_or_today(day: Option<u32>) -> Day {
    day.map(Day::new).unwrap_or_else(current_day)
}

// =============================================================================
// HEALTH HANDLER
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

// =============================================================================
// STATUS HANDLER
// =============================================================================

/// Repository status.
pub async fn status_handler(
    State(state): State<AppState>,
) -> Result<Json<StatusResponse>, ApiError> {
    let repo = state.repository.read().await;
    let overview = repo.bank_overview().map_err(api_error)?;
    let courses = repo.courses().map_err(api_error)?;

    Ok(Json(StatusResponse {
        bank_count: overview.len(),
        word_count: overview.iter().map(|b| b.word_count).sum(),
        mastered_count: overview.iter().map(|b| b.distribution.mastered()).sum(),
        course_count: courses.len(),
        persistent: repo.is_persistent(),
    }))
}

// =============================================================================
// BANK HANDLERS
// =============================================================================

/// List banks.
pub async fn list_banks_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<BankSummary>>, ApiError> {
    let repo = state.repository.read().await;
    let overview = repo.bank_overview().map_err(api_error)?;

    Ok(Json(
        overview
            .into_iter()
            .map(|entry| BankSummary {
                id: entry.bank.id.0,
                name: entry.bank.name,
                created: entry.bank.created.value(),
                word_count: entry.word_count,
                mastered_percent: entry.distribution.mastered_percent(),
            })
            .collect(),
    ))
}

/// Create a bank.
pub async fn create_bank_handler(
    State(state): State<AppState>,
    Json(request): Json<CreateBankRequest>,
) -> impl IntoResponse {
    let mut repo = state.repository.write().await;
    match repo.create_bank(&request.name, current_day()) {
        Ok(bank) => (StatusCode::OK, Json(BankResponse::success(bank))),
        Err(e) => (
            status_for(&e),
            Json(BankResponse::error(format!("Create bank failed: {}", e))),
        ),
    }
}

// =============================================================================
// WORD HANDLERS
// =============================================================================

/// List the words of a bank.
pub async fn list_words_handler(
    State(state): State<AppState>,
    Path(bank_id): Path<u64>,
) -> Result<Json<WordsResponse>, ApiError> {
    let repo = state.repository.read().await;
    let words = repo.words(BankId(bank_id)).map_err(api_error)?;
    Ok(Json(WordsResponse { bank_id, words }))
}

/// Add words to a bank.
pub async fn add_words_handler(
    State(state): State<AppState>,
    Path(bank_id): Path<u64>,
    Json(request): Json<AddWordsRequest>,
) -> impl IntoResponse {
    if let Err(e) = request.validate() {
        return (
            StatusCode::BAD_REQUEST,
            Json(AddWordsResponse::error(format!("Invalid words: {}", e))),
        );
    }

    let mut repo = state.repository.write().await;
    match repo.add_words(BankId(bank_id), &request.words) {
        Ok(outcome) => (
            StatusCode::OK,
            Json(AddWordsResponse::success(
                &outcome.added,
                outcome.duplicates,
            )),
        ),
        Err(e) => (
            status_for(&e),
            Json(AddWordsResponse::error(format!("Add words failed: {}", e))),
        ),
    }
}

// =============================================================================
// REVIEW HANDLERS
// =============================================================================

/// Per-stage counts of a bank.
pub async fn stages_handler(
    State(state): State<AppState>,
    Path(bank_id): Path<u64>,
) -> Result<Json<StagesResponse>, ApiError> {
    let repo = state.repository.read().await;
    let progress = repo.stage_progress(BankId(bank_id)).map_err(api_error)?;
    Ok(Json(StagesResponse::from(&progress)))
}

/// Record recall results.
pub async fn review_handler(
    State(state): State<AppState>,
    Path(bank_id): Path<u64>,
    Json(request): Json<ReviewRequest>,
) -> impl IntoResponse {
    let parsed = request
        .policy()
        .and_then(|policy| Ok((policy, request.to_recalls()?)));
    let (policy, recalls) = match parsed {
        Ok(p) => p,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ReviewResponse::error(format!("Invalid review: {}", e))),
            );
        }
    };

    let today = day_or_today(request.day);
    let mut repo = state.repository.write().await;
    match repo.record_recalls(BankId(bank_id), &recalls, policy, today) {
        Ok(outcome) => (
            StatusCode::OK,
            Json(ReviewResponse::success(
                outcome.changes,
                outcome.distribution,
            )),
        ),
        Err(e) => (
            status_for(&e),
            Json(ReviewResponse::error(format!("Review failed: {}", e))),
        ),
    }
}

/// Review grid of a bank.
pub async fn grid_handler(
    State(state): State<AppState>,
    Path(bank_id): Path<u64>,
    Query(query): Query<GridQuery>,
) -> Result<Json<GridResponse>, ApiError> {
    let filter = query.filter().map_err(api_error)?;
    let columns = query.columns.unwrap_or(state.grid_columns);

    let repo = state.repository.read().await;
    let grid = repo
        .review_grid(BankId(bank_id), filter, columns)
        .map_err(api_error)?;

    Ok(Json(GridResponse {
        bank_id,
        cell_count: grid.cell_count(),
        grid,
    }))
}

/// Words due for anti-forgetting review.
pub async fn due_handler(
    State(state): State<AppState>,
    Path(bank_id): Path<u64>,
    Query(query): Query<DayQuery>,
) -> Result<Json<DueResponse>, ApiError> {
    let today = day_or_today(query.day);
    let repo = state.repository.read().await;
    let due = repo.due_words(BankId(bank_id), today).map_err(api_error)?;

    Ok(Json(DueResponse {
        bank_id,
        day: today.value(),
        due,
    }))
}

// =============================================================================
// COURSE HANDLERS
// =============================================================================

/// List courses.
pub async fn list_courses_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<Course>>, ApiError> {
    let repo = state.repository.read().await;
    repo.courses().map(Json).map_err(api_error)
}

/// Create a course.
pub async fn create_course_handler(
    State(state): State<AppState>,
    Json(request): Json<CreateCourseRequest>,
) -> impl IntoResponse {
    let input = NewCourse {
        name: request.name,
        bank: BankId(request.bank_id),
        daily_new: request.daily_new,
        start: day_or_today(request.start),
    };

    let mut repo = state.repository.write().await;
    match repo.create_course(&input) {
        Ok(course) => (StatusCode::OK, Json(CourseResponse::success(course))),
        Err(e) => (
            status_for(&e),
            Json(CourseResponse::error(format!("Create course failed: {}", e))),
        ),
    }
}

/// Course schedule, optionally with one day's word list.
pub async fn course_plan_handler(
    State(state): State<AppState>,
    Path(course_id): Path<u64>,
    Query(query): Query<DayQuery>,
) -> Result<Json<PlanResponse>, ApiError> {
    let repo = state.repository.read().await;
    let plan = repo.course_plan(CourseId(course_id)).map_err(api_error)?;
    let words = query.day.map(|d| plan.words_for(Day::new(d)));
    Ok(Json(PlanResponse { plan, words }))
}

// =============================================================================
// EXPORT & HASH HANDLERS
// =============================================================================

/// Export the repository as a base64 snapshot.
pub async fn export_handler(State(state): State<AppState>) -> impl IntoResponse {
    let repo = state.repository.read().await;

    let snapshot = match repo.snapshot() {
        Ok(s) => s,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ExportResponse::error(format!(
                    "Failed to build snapshot: {}",
                    e
                ))),
            );
        }
    };

    match snapshot_to_bytes(&snapshot).and_then(|data| Ok((data, snapshot_checksum(&snapshot)?)))
    {
        Ok((data, checksum)) => (
            StatusCode::OK,
            Json(ExportResponse::success(data, checksum)),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ExportResponse::error(format!("Export failed: {}", e))),
        ),
    }
}

/// BLAKE3 hash of the current snapshot.
pub async fn hash_handler(
    State(state): State<AppState>,
) -> Result<Json<HashResponse>, ApiError> {
    let repo = state.repository.read().await;
    let snapshot = repo.snapshot().map_err(api_error)?;
    let hash = snapshot_checksum(&snapshot).map_err(api_error)?;

    Ok(Json(HashResponse {
        hash,
        algorithm: "blake3".to_string(),
        word_count: snapshot.word_count(),
    }))
}
