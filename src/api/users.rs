use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use super::auth::CurrentUser;
use super::validation::validate_limit;
use super::{ApiError, ApiResponse, AppState, SubscriptionDto, UserDto};

#[derive(Deserialize)]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub timezone: Option<String>,
    pub preferred_units: Option<String>,
    pub locale: Option<String>,
    pub height_cm: Option<f32>,
    pub weight_kg: Option<f32>,
    pub date_of_birth: Option<String>,
    pub fitness_goal: Option<String>,
    pub training_experience: Option<String>,
    pub training_frequency: Option<i32>,
}

#[derive(Deserialize)]
pub struct ListUsersQuery {
    pub search: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

fn require_superuser(user: &CurrentUser) -> Result<(), ApiError> {
    if user.0.is_superuser {
        Ok(())
    } else {
        Err(ApiError::forbidden("Superuser access required"))
    }
}

/// GET /users/me
pub async fn get_me(
    Extension(current): Extension<CurrentUser>,
) -> Json<ApiResponse<UserDto>> {
    Json(ApiResponse::success(current.0.into()))
}

/// PUT /users/me
pub async fn update_me(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    if let Some(units) = &payload.preferred_units
        && units != "metric"
        && units != "imperial"
    {
        return Err(ApiError::validation(
            "preferred_units must be 'metric' or 'imperial'",
        ));
    }

    if let Some(frequency) = payload.training_frequency
        && !(0..=14).contains(&frequency)
    {
        return Err(ApiError::validation(
            "training_frequency must be between 0 and 14 sessions per week",
        ));
    }

    let update = crate::db::UserUpdate {
        full_name: payload.full_name,
        timezone: payload.timezone,
        preferred_units: payload.preferred_units,
        locale: payload.locale,
        height_cm: payload.height_cm,
        weight_kg: payload.weight_kg,
        date_of_birth: payload.date_of_birth,
        fitness_goal: payload.fitness_goal,
        training_experience: payload.training_experience,
        training_frequency: payload.training_frequency,
    };

    let user = state
        .store()
        .update_user_profile(current.0.id, update)
        .await?
        .ok_or_else(|| ApiError::not_found("User", current.0.id))?;

    Ok(Json(ApiResponse::success(user.into())))
}

/// GET /users/me/subscription
/// Current subscription, falling back to the free tier
pub async fn get_my_subscription(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<SubscriptionDto>>, ApiError> {
    let dto = match state
        .store()
        .active_subscription_for_user(current.0.id)
        .await?
    {
        Some((subscription, plan)) => SubscriptionDto {
            plan_name: plan.name,
            plan_type: plan.plan_type,
            price_cents: plan.price_cents,
            is_active: subscription.is_active,
            current_period_end: subscription.current_period_end,
            cancel_at_period_end: subscription.cancel_at_period_end,
        },
        None => {
            let free = state
                .store()
                .get_plan_by_type(crate::models::PlanType::Free)
                .await?
                .ok_or_else(|| ApiError::internal("Free plan missing from database"))?;
            SubscriptionDto {
                plan_name: free.name,
                plan_type: free.plan_type,
                price_cents: free.price_cents,
                is_active: true,
                current_period_end: None,
                cancel_at_period_end: false,
            }
        }
    };

    Ok(Json(ApiResponse::success(dto)))
}

/// GET /users (superuser only)
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<ApiResponse<Vec<UserDto>>>, ApiError> {
    require_superuser(&current)?;

    let limit = validate_limit(query.limit.unwrap_or(50))?;
    let offset = query.offset.unwrap_or(0);

    let users = state
        .store()
        .list_users(query.search.as_deref(), limit, offset)
        .await?;

    Ok(Json(ApiResponse::success(
        users.into_iter().map(Into::into).collect(),
    )))
}

/// GET /users/{id} (superuser only)
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    require_superuser(&current)?;

    let user = state
        .store()
        .get_user(id)
        .await?
        .ok_or_else(|| ApiError::not_found("User", id))?;

    Ok(Json(ApiResponse::success(user.into())))
}

/// PUT /users/{id}/active (superuser only)
pub async fn set_user_active(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SetActiveRequest>,
) -> Result<Json<ApiResponse<super::MessageResponse>>, ApiError> {
    require_superuser(&current)?;

    if id == current.0.id && !payload.is_active {
        return Err(ApiError::validation(
            "You cannot deactivate your own account",
        ));
    }

    let updated = state.store().set_user_active(id, payload.is_active).await?;
    if !updated {
        return Err(ApiError::not_found("User", id));
    }

    tracing::info!("User {} active set to {}", id, payload.is_active);

    Ok(Json(ApiResponse::success(super::MessageResponse::new(
        "User updated",
    ))))
}

#[derive(Deserialize)]
pub struct SetActiveRequest {
    pub is_active: bool,
}
