use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use super::auth::CurrentUser;
use super::validation::{validate_limit, validate_rating};
use super::{ApiError, ApiResponse, AppState, SessionDto};
use crate::db::SessionCompletion;
use crate::models::SessionStatus;

#[derive(Deserialize)]
pub struct StartSessionRequest {
    pub workout_id: Uuid,
}

#[derive(Deserialize, Default)]
pub struct CompleteSessionRequest {
    pub notes: Option<String>,
    pub calories_burned: Option<i32>,
    pub mood_rating: Option<i32>,
    pub difficulty_rating: Option<i32>,
}

#[derive(Deserialize)]
pub struct ListSessionsQuery {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// Load a session the user may act on. Sessions are strictly per-user;
/// superusers get read access elsewhere, not control.
async fn load_own_session(
    state: &AppState,
    current: &CurrentUser,
    id: Uuid,
) -> Result<crate::db::WorkoutSession, ApiError> {
    let session = state
        .store()
        .get_session(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Workout session", id))?;

    if session.user_id != current.0.id {
        return Err(ApiError::forbidden("This session belongs to another user"));
    }

    Ok(session)
}

fn require_in_progress(session: &crate::db::WorkoutSession) -> Result<(), ApiError> {
    if session.status == SessionStatus::InProgress.as_str() {
        Ok(())
    } else {
        Err(ApiError::validation(format!(
            "Session is {}, not in progress",
            session.status
        )))
    }
}

/// POST /sessions/start
/// One in-progress session per user at a time.
pub async fn start_session(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<StartSessionRequest>,
) -> Result<(StatusCode, Json<ApiResponse<SessionDto>>), ApiError> {
    let workout = state
        .store()
        .get_workout(payload.workout_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Workout", payload.workout_id))?;

    if !workout.is_public && workout.created_by != current.0.id && !current.0.is_superuser {
        return Err(ApiError::forbidden("This workout is private"));
    }

    if state
        .store()
        .active_session_for_user(current.0.id)
        .await?
        .is_some()
    {
        return Err(ApiError::validation(
            "You already have an active workout session",
        ));
    }

    let session = state
        .store()
        .start_session(current.0.id, payload.workout_id)
        .await?;

    tracing::info!(
        "Session {} started for workout {}",
        session.id,
        payload.workout_id
    );

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(session.into())),
    ))
}

/// POST /sessions/{id}/complete
pub async fn complete_session(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CompleteSessionRequest>,
) -> Result<Json<ApiResponse<SessionDto>>, ApiError> {
    let session = load_own_session(&state, &current, id).await?;
    require_in_progress(&session)?;

    if let Some(mood) = payload.mood_rating {
        validate_rating(mood, 1, 5, "mood_rating")?;
    }
    if let Some(difficulty) = payload.difficulty_rating {
        validate_rating(difficulty, 1, 10, "difficulty_rating")?;
    }
    if let Some(calories) = payload.calories_burned
        && calories < 0
    {
        return Err(ApiError::validation("calories_burned cannot be negative"));
    }

    let session = state
        .store()
        .finish_session(
            session,
            SessionStatus::Completed,
            SessionCompletion {
                notes: payload.notes,
                calories_burned: payload.calories_burned,
                mood_rating: payload.mood_rating,
                difficulty_rating: payload.difficulty_rating,
            },
        )
        .await?;

    Ok(Json(ApiResponse::success(session.into())))
}

/// POST /sessions/{id}/abandon
/// Ends the session without counting it as completed
pub async fn abandon_session(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<SessionDto>>, ApiError> {
    let session = load_own_session(&state, &current, id).await?;
    require_in_progress(&session)?;

    let session = state
        .store()
        .finish_session(
            session,
            SessionStatus::Abandoned,
            SessionCompletion::default(),
        )
        .await?;

    Ok(Json(ApiResponse::success(session.into())))
}

/// GET /sessions
pub async fn list_sessions(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<ListSessionsQuery>,
) -> Result<Json<ApiResponse<Vec<SessionDto>>>, ApiError> {
    let limit = validate_limit(query.limit.unwrap_or(50))?;
    let offset = query.offset.unwrap_or(0);

    let sessions = state
        .store()
        .list_sessions_for_user(current.0.id, limit, offset)
        .await?;

    Ok(Json(ApiResponse::success(
        sessions.into_iter().map(Into::into).collect(),
    )))
}

/// GET /sessions/{id}
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<SessionDto>>, ApiError> {
    let session = state
        .store()
        .get_session(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Workout session", id))?;

    if session.user_id != current.0.id && !current.0.is_superuser {
        return Err(ApiError::forbidden("This session belongs to another user"));
    }

    Ok(Json(ApiResponse::success(session.into())))
}
