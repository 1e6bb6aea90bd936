use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use super::auth::CurrentUser;
use super::validation::validate_limit;
use super::{ApiError, ApiResponse, AppState, MessageResponse, WorkoutDto, WorkoutPlanDto};
use super::{PlanEntryDto, WorkoutExerciseDto};
use crate::db::{NewWorkout, NewWorkoutPlan, PlanEntry, Workout, WorkoutExerciseEntry};
use crate::models::Difficulty;

#[derive(Deserialize)]
pub struct CreateWorkoutRequest {
    pub name: String,
    pub description: Option<String>,
    pub difficulty: Option<String>,
    pub estimated_duration_minutes: Option<i32>,
    pub calories_burn_estimate: Option<i32>,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub is_template: bool,
    pub exercises: Vec<WorkoutExerciseDto>,
}

#[derive(Deserialize)]
pub struct ListWorkoutsQuery {
    pub difficulty: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

#[derive(Deserialize)]
pub struct CreatePlanRequest {
    pub name: String,
    pub description: Option<String>,
    pub duration_weeks: i32,
    pub difficulty: Option<String>,
    #[serde(default)]
    pub is_public: bool,
    pub entries: Vec<PlanEntryDto>,
}

#[derive(Deserialize)]
pub struct ListPlansQuery {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

fn validate_difficulty(value: &str) -> Result<(), ApiError> {
    value
        .parse::<Difficulty>()
        .map(|_| ())
        .map_err(ApiError::validation)
}

/// A workout is visible to its creator, to superusers, and to everyone
/// when public.
fn check_read_permission(workout: &Workout, current: &CurrentUser) -> Result<(), ApiError> {
    if workout.is_public || workout.created_by == current.0.id || current.0.is_superuser {
        Ok(())
    } else {
        Err(ApiError::forbidden("This workout is private"))
    }
}

fn check_modify_permission(workout: &Workout, current: &CurrentUser) -> Result<(), ApiError> {
    if workout.created_by == current.0.id || current.0.is_superuser {
        Ok(())
    } else {
        Err(ApiError::forbidden(
            "You do not have permission to modify this workout",
        ))
    }
}

async fn validate_exercise_entries(
    state: &AppState,
    entries: &[WorkoutExerciseDto],
) -> Result<(), ApiError> {
    if entries.is_empty() {
        return Err(ApiError::validation(
            "A workout needs at least one exercise",
        ));
    }

    for entry in entries {
        if entry.position < 1 {
            return Err(ApiError::validation("Exercise positions start at 1"));
        }
        if entry.sets < 1 {
            return Err(ApiError::validation("Each exercise needs at least 1 set"));
        }
        if entry.reps.is_none() && entry.duration_seconds.is_none() {
            return Err(ApiError::validation(
                "Each exercise needs either reps or a duration",
            ));
        }
        if state.store().get_exercise(entry.exercise_id).await?.is_none() {
            return Err(ApiError::validation(format!(
                "Unknown exercise: {}",
                entry.exercise_id
            )));
        }
    }

    Ok(())
}

// ============================================================================
// Workouts
// ============================================================================

/// POST /workouts
/// Creation counts against the subscription tier's workout limit,
/// except templates, which only superusers may create.
pub async fn create_workout(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<CreateWorkoutRequest>,
) -> Result<(StatusCode, Json<ApiResponse<WorkoutDto>>), ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::validation("Workout name is required"));
    }
    if let Some(difficulty) = &payload.difficulty {
        validate_difficulty(difficulty)?;
    }
    validate_exercise_entries(&state, &payload.exercises).await?;

    let is_template = payload.is_template && current.0.is_superuser;
    if !is_template {
        state
            .shared
            .plan_limits
            .check_workout_limit(current.0.id)
            .await?;
    }

    let workout = state
        .store()
        .create_workout(NewWorkout {
            name: payload.name.trim().to_string(),
            description: payload.description,
            difficulty: payload.difficulty,
            estimated_duration_minutes: payload.estimated_duration_minutes,
            calories_burn_estimate: payload.calories_burn_estimate,
            is_public: payload.is_public,
            is_template,
            created_by: current.0.id,
            exercises: payload
                .exercises
                .into_iter()
                .map(|e| WorkoutExerciseEntry {
                    exercise_id: e.exercise_id,
                    position: e.position,
                    sets: e.sets,
                    reps: e.reps,
                    duration_seconds: e.duration_seconds,
                    rest_seconds: e.rest_seconds,
                    notes: e.notes,
                })
                .collect(),
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(workout.into())),
    ))
}

/// GET /workouts
/// The user's own workouts plus public ones
pub async fn list_workouts(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<ListWorkoutsQuery>,
) -> Result<Json<ApiResponse<Vec<WorkoutDto>>>, ApiError> {
    if let Some(difficulty) = &query.difficulty {
        validate_difficulty(difficulty)?;
    }

    let limit = validate_limit(query.limit.unwrap_or(50))?;
    let offset = query.offset.unwrap_or(0);

    let workouts = state
        .store()
        .list_workouts(current.0.id, true, query.difficulty.as_deref(), limit, offset)
        .await?;

    Ok(Json(ApiResponse::success(
        workouts.into_iter().map(Into::into).collect(),
    )))
}

/// GET /workouts/{id}
pub async fn get_workout(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<WorkoutDto>>, ApiError> {
    let workout = state
        .store()
        .get_workout(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Workout", id))?;

    check_read_permission(&workout, &current)?;

    Ok(Json(ApiResponse::success(workout.into())))
}

/// DELETE /workouts/{id}
pub async fn delete_workout(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let workout = state
        .store()
        .get_workout(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Workout", id))?;

    check_modify_permission(&workout, &current)?;

    state.store().delete_workout(id).await?;

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Workout deleted",
    ))))
}

// ============================================================================
// Workout Plans
// ============================================================================

/// POST /plans
pub async fn create_plan(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<CreatePlanRequest>,
) -> Result<(StatusCode, Json<ApiResponse<WorkoutPlanDto>>), ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::validation("Plan name is required"));
    }
    if !(1..=52).contains(&payload.duration_weeks) {
        return Err(ApiError::validation(
            "duration_weeks must be between 1 and 52",
        ));
    }
    if let Some(difficulty) = &payload.difficulty {
        validate_difficulty(difficulty)?;
    }
    if payload.entries.is_empty() {
        return Err(ApiError::validation("A plan needs at least one workout"));
    }

    for entry in &payload.entries {
        if !(1..=payload.duration_weeks).contains(&entry.week_number) {
            return Err(ApiError::validation(format!(
                "week_number {} is outside the plan duration",
                entry.week_number
            )));
        }
        if !(1..=7).contains(&entry.day_number) {
            return Err(ApiError::validation("day_number must be between 1 and 7"));
        }

        let workout = state
            .store()
            .get_workout(entry.workout_id)
            .await?
            .ok_or_else(|| {
                ApiError::validation(format!("Unknown workout: {}", entry.workout_id))
            })?;
        check_read_permission(&workout, &current).map_err(|_| {
            ApiError::validation(format!("Unknown workout: {}", entry.workout_id))
        })?;
    }

    state
        .shared
        .plan_limits
        .check_plan_limit(current.0.id)
        .await?;

    let plan = state
        .store()
        .create_workout_plan(NewWorkoutPlan {
            name: payload.name.trim().to_string(),
            description: payload.description,
            duration_weeks: payload.duration_weeks,
            difficulty: payload.difficulty,
            is_public: payload.is_public,
            created_by: current.0.id,
            entries: payload
                .entries
                .into_iter()
                .map(|e| PlanEntry {
                    workout_id: e.workout_id,
                    week_number: e.week_number,
                    day_number: e.day_number,
                })
                .collect(),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(plan.into()))))
}

/// GET /plans
pub async fn list_plans(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<ListPlansQuery>,
) -> Result<Json<ApiResponse<Vec<WorkoutPlanDto>>>, ApiError> {
    let limit = validate_limit(query.limit.unwrap_or(50))?;
    let offset = query.offset.unwrap_or(0);

    let plans = state
        .store()
        .list_workout_plans(current.0.id, true, limit, offset)
        .await?;

    Ok(Json(ApiResponse::success(
        plans.into_iter().map(Into::into).collect(),
    )))
}

/// GET /plans/{id}
pub async fn get_plan(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<WorkoutPlanDto>>, ApiError> {
    let plan = state
        .store()
        .get_workout_plan(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Workout plan", id))?;

    if !plan.is_public && plan.created_by != current.0.id && !current.0.is_superuser {
        return Err(ApiError::forbidden("This workout plan is private"));
    }

    Ok(Json(ApiResponse::success(plan.into())))
}
