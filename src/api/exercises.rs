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
use super::{ApiError, ApiResponse, AppState, ExerciseDto, MessageResponse, TaxonomyDto};
use crate::clients::PresignedUpload;
use crate::db::{ExerciseFilter, ExerciseUpdate, NewExercise};
use crate::models::Difficulty;

#[derive(Deserialize)]
pub struct CreateExerciseRequest {
    pub name: String,
    pub description: Option<String>,
    pub instructions: Option<String>,
    pub difficulty: String,
    pub mechanics: Option<String>,
    #[serde(default)]
    pub is_bodyweight: bool,
    #[serde(default)]
    pub unilateral: bool,
    pub video_url: Option<String>,
    pub category_id: Uuid,
    pub notes: Option<String>,
    #[serde(default)]
    pub muscle_group_ids: Vec<Uuid>,
    #[serde(default)]
    pub equipment_ids: Vec<Uuid>,
}

#[derive(Deserialize)]
pub struct UpdateExerciseRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub instructions: Option<String>,
    pub difficulty: Option<String>,
    pub mechanics: Option<String>,
    pub video_url: Option<String>,
    pub notes: Option<String>,
    pub category_id: Option<Uuid>,
    pub muscle_group_ids: Option<Vec<Uuid>>,
    pub equipment_ids: Option<Vec<Uuid>>,
}

#[derive(Deserialize)]
pub struct ListExercisesQuery {
    pub category_id: Option<Uuid>,
    pub difficulty: Option<String>,
    pub muscle_group_id: Option<Uuid>,
    pub equipment_id: Option<Uuid>,
    pub include_custom: Option<bool>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

#[derive(Deserialize)]
pub struct PresignImageRequest {
    pub content_type: String,
}

#[derive(Deserialize)]
pub struct DeleteImageRequest {
    pub key: String,
}

#[derive(serde::Serialize)]
pub struct ExerciseImageDto {
    pub key: String,
    pub url: String,
}

fn validate_difficulty(value: &str) -> Result<(), ApiError> {
    value
        .parse::<Difficulty>()
        .map(|_| ())
        .map_err(ApiError::validation)
}

async fn validate_taxonomy(
    state: &AppState,
    category_id: Uuid,
    muscle_group_ids: &[Uuid],
    equipment_ids: &[Uuid],
) -> Result<(), ApiError> {
    if !state.store().exercise_category_exists(category_id).await? {
        return Err(ApiError::validation(format!(
            "Unknown exercise category: {category_id}"
        )));
    }

    let missing = state.store().missing_muscle_groups(muscle_group_ids).await?;
    if let Some(id) = missing.first() {
        return Err(ApiError::validation(format!("Unknown muscle group: {id}")));
    }

    let missing = state.store().missing_equipment(equipment_ids).await?;
    if let Some(id) = missing.first() {
        return Err(ApiError::validation(format!("Unknown equipment: {id}")));
    }

    Ok(())
}

/// May the user modify this exercise? Built-in entries belong to the
/// catalog and only superusers touch them.
fn check_modify_permission(
    exercise: &crate::db::Exercise,
    current: &CurrentUser,
) -> Result<(), ApiError> {
    if current.0.is_superuser {
        return Ok(());
    }
    if exercise.is_custom && exercise.created_by == Some(current.0.id) {
        return Ok(());
    }
    Err(ApiError::forbidden(
        "You do not have permission to modify this exercise",
    ))
}

// ============================================================================
// Taxonomy
// ============================================================================

/// GET /exercises/categories
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<TaxonomyDto>>>, ApiError> {
    let categories = state.store().list_exercise_categories().await?;
    Ok(Json(ApiResponse::success(
        categories.into_iter().map(Into::into).collect(),
    )))
}

/// GET /exercises/muscle-groups
pub async fn list_muscle_groups(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<TaxonomyDto>>>, ApiError> {
    let groups = state.store().list_muscle_groups().await?;
    Ok(Json(ApiResponse::success(
        groups.into_iter().map(Into::into).collect(),
    )))
}

/// GET /exercises/equipment
pub async fn list_equipment(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<TaxonomyDto>>>, ApiError> {
    let equipment = state.store().list_equipment().await?;
    Ok(Json(ApiResponse::success(
        equipment.into_iter().map(Into::into).collect(),
    )))
}

// ============================================================================
// Exercises
// ============================================================================

/// POST /exercises
/// Superusers create catalog entries; everyone else creates custom
/// exercises, gated by their subscription tier.
pub async fn create_exercise(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<CreateExerciseRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ExerciseDto>>), ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::validation("Exercise name is required"));
    }
    validate_difficulty(&payload.difficulty)?;
    validate_taxonomy(
        &state,
        payload.category_id,
        &payload.muscle_group_ids,
        &payload.equipment_ids,
    )
    .await?;

    let is_custom = !current.0.is_superuser;
    if is_custom {
        state
            .shared
            .plan_limits
            .check_custom_exercise_permission(current.0.id)
            .await?;
    }

    let name = payload.name.trim().to_string();
    if state.store().exercise_name_exists(&name).await? {
        return Err(ApiError::Conflict(format!(
            "An exercise named '{name}' already exists"
        )));
    }

    let exercise = state
        .store()
        .create_exercise(NewExercise {
            name,
            description: payload.description,
            instructions: payload.instructions,
            difficulty: payload.difficulty,
            mechanics: payload.mechanics,
            is_bodyweight: payload.is_bodyweight,
            unilateral: payload.unilateral,
            video_url: payload.video_url,
            is_custom,
            created_by: is_custom.then_some(current.0.id),
            category_id: payload.category_id,
            notes: payload.notes,
            muscle_group_ids: payload.muscle_group_ids,
            equipment_ids: payload.equipment_ids,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(exercise.into())),
    ))
}

/// GET /exercises
pub async fn list_exercises(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListExercisesQuery>,
) -> Result<Json<ApiResponse<Vec<ExerciseDto>>>, ApiError> {
    if let Some(difficulty) = &query.difficulty {
        validate_difficulty(difficulty)?;
    }

    let limit = validate_limit(query.limit.unwrap_or(50))?;
    let offset = query.offset.unwrap_or(0);

    let filter = ExerciseFilter {
        category_id: query.category_id,
        difficulty: query.difficulty,
        muscle_group_id: query.muscle_group_id,
        equipment_id: query.equipment_id,
        include_custom: query.include_custom.unwrap_or(true),
    };

    let exercises = state.store().list_exercises(&filter, limit, offset).await?;

    Ok(Json(ApiResponse::success(
        exercises.into_iter().map(Into::into).collect(),
    )))
}

/// GET /exercises/{id}
pub async fn get_exercise(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ExerciseDto>>, ApiError> {
    let exercise = state
        .store()
        .get_exercise(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Exercise", id))?;

    Ok(Json(ApiResponse::success(exercise.into())))
}

/// PUT /exercises/{id}
pub async fn update_exercise(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateExerciseRequest>,
) -> Result<Json<ApiResponse<ExerciseDto>>, ApiError> {
    let exercise = state
        .store()
        .get_exercise(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Exercise", id))?;

    check_modify_permission(&exercise, &current)?;

    if let Some(difficulty) = &payload.difficulty {
        validate_difficulty(difficulty)?;
    }
    if let Some(category_id) = payload.category_id
        && !state.store().exercise_category_exists(category_id).await?
    {
        return Err(ApiError::validation(format!(
            "Unknown exercise category: {category_id}"
        )));
    }
    if let Some(ids) = &payload.muscle_group_ids {
        let missing = state.store().missing_muscle_groups(ids).await?;
        if let Some(id) = missing.first() {
            return Err(ApiError::validation(format!("Unknown muscle group: {id}")));
        }
    }
    if let Some(ids) = &payload.equipment_ids {
        let missing = state.store().missing_equipment(ids).await?;
        if let Some(id) = missing.first() {
            return Err(ApiError::validation(format!("Unknown equipment: {id}")));
        }
    }

    if let Some(name) = &payload.name {
        let name = name.trim();
        if name.is_empty() {
            return Err(ApiError::validation("Exercise name cannot be empty"));
        }
        if name != exercise.name && state.store().exercise_name_exists(name).await? {
            return Err(ApiError::Conflict(format!(
                "An exercise named '{name}' already exists"
            )));
        }
    }

    let update = ExerciseUpdate {
        name: payload.name.map(|n| n.trim().to_string()),
        description: payload.description,
        instructions: payload.instructions,
        difficulty: payload.difficulty,
        mechanics: payload.mechanics,
        video_url: payload.video_url,
        notes: payload.notes,
        category_id: payload.category_id,
        muscle_group_ids: payload.muscle_group_ids,
        equipment_ids: payload.equipment_ids,
    };

    let exercise = state
        .store()
        .update_exercise(id, update)
        .await?
        .ok_or_else(|| ApiError::not_found("Exercise", id))?;

    Ok(Json(ApiResponse::success(exercise.into())))
}

/// DELETE /exercises/{id}
pub async fn delete_exercise(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let exercise = state
        .store()
        .get_exercise(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Exercise", id))?;

    check_modify_permission(&exercise, &current)?;

    // Object deletion is best effort; the row goes away regardless.
    if let Some(storage) = &state.shared.storage {
        for key in &exercise.image_keys {
            if let Err(e) = storage.delete(key).await {
                tracing::warn!("Failed to delete image {}: {}", key, e);
            }
        }
    }

    state.store().delete_exercise(id).await?;

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Exercise deleted",
    ))))
}

// ============================================================================
// Images
// ============================================================================

/// POST /exercises/{id}/images
/// Returns a presigned upload URL and records the object key
pub async fn presign_image_upload(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<PresignImageRequest>,
) -> Result<Json<ApiResponse<PresignedUpload>>, ApiError> {
    let Some(storage) = &state.shared.storage else {
        return Err(ApiError::validation("Image storage is not enabled"));
    };

    if !payload.content_type.starts_with("image/") {
        return Err(ApiError::validation("content_type must be an image type"));
    }

    let exercise = state
        .store()
        .get_exercise(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Exercise", id))?;

    check_modify_permission(&exercise, &current)?;

    let key = storage.new_image_key(id, &payload.content_type);
    let upload = storage
        .presign_put(&key, &payload.content_type)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to presign upload: {e}")))?;

    let mut keys = exercise.image_keys;
    keys.push(key);
    state.store().set_exercise_image_keys(id, &keys).await?;

    Ok(Json(ApiResponse::success(upload)))
}

/// GET /exercises/{id}/images
/// Presigned download URLs for the stored images; keys alone are useless
/// against a private bucket.
pub async fn list_images(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<ExerciseImageDto>>>, ApiError> {
    let Some(storage) = &state.shared.storage else {
        return Err(ApiError::validation("Image storage is not enabled"));
    };

    let exercise = state
        .store()
        .get_exercise(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Exercise", id))?;

    let mut images = Vec::with_capacity(exercise.image_keys.len());
    for key in exercise.image_keys {
        let url = storage
            .presign_get(&key)
            .await
            .map_err(|e| ApiError::internal(format!("Failed to presign download: {e}")))?;
        images.push(ExerciseImageDto { key, url });
    }

    Ok(Json(ApiResponse::success(images)))
}

/// DELETE /exercises/{id}/images
pub async fn delete_image(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<DeleteImageRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let Some(storage) = &state.shared.storage else {
        return Err(ApiError::validation("Image storage is not enabled"));
    };

    let exercise = state
        .store()
        .get_exercise(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Exercise", id))?;

    check_modify_permission(&exercise, &current)?;

    if !exercise.image_keys.contains(&payload.key) {
        return Err(ApiError::not_found("Image", &payload.key));
    }

    storage
        .delete(&payload.key)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to delete image: {e}")))?;

    let keys: Vec<String> = exercise
        .image_keys
        .into_iter()
        .filter(|k| k != &payload.key)
        .collect();
    state.store().set_exercise_image_keys(id, &keys).await?;

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Image deleted",
    ))))
}
