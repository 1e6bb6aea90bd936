use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db;
use crate::services::TokenPair;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserDto {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub full_name: Option<String>,
    pub is_active: bool,
    pub is_superuser: bool,
    pub timezone: Option<String>,
    pub preferred_units: Option<String>,
    pub locale: Option<String>,
    pub height_cm: Option<f32>,
    pub weight_kg: Option<f32>,
    pub date_of_birth: Option<String>,
    pub fitness_goal: Option<String>,
    pub training_experience: Option<String>,
    pub training_frequency: Option<i32>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<db::User> for UserDto {
    fn from(user: db::User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            username: user.username,
            full_name: user.full_name,
            is_active: user.is_active,
            is_superuser: user.is_superuser,
            timezone: user.timezone,
            preferred_units: user.preferred_units,
            locale: user.locale,
            height_cm: user.height_cm,
            weight_kg: user.weight_kg,
            date_of_birth: user.date_of_birth,
            fitness_goal: user.fitness_goal,
            training_experience: user.training_experience,
            training_frequency: user.training_frequency,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserDto,
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
}

impl AuthResponse {
    #[must_use]
    pub fn new(user: db::User, tokens: TokenPair) -> Self {
        Self {
            user: user.into(),
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            token_type: tokens.token_type,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TaxonomyDto {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

impl From<db::exercise_categories::Model> for TaxonomyDto {
    fn from(m: db::exercise_categories::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            description: m.description,
        }
    }
}

impl From<db::muscle_groups::Model> for TaxonomyDto {
    fn from(m: db::muscle_groups::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            description: m.description,
        }
    }
}

impl From<db::equipment::Model> for TaxonomyDto {
    fn from(m: db::equipment::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            description: m.description,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ExerciseDto {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub instructions: Option<String>,
    pub difficulty: String,
    pub mechanics: Option<String>,
    pub is_bodyweight: bool,
    pub unilateral: bool,
    pub video_url: Option<String>,
    pub image_keys: Vec<String>,
    pub is_custom: bool,
    pub created_by: Option<Uuid>,
    pub category_id: Uuid,
    pub notes: Option<String>,
    pub muscle_group_ids: Vec<Uuid>,
    pub equipment_ids: Vec<Uuid>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<db::Exercise> for ExerciseDto {
    fn from(e: db::Exercise) -> Self {
        Self {
            id: e.id,
            name: e.name,
            description: e.description,
            instructions: e.instructions,
            difficulty: e.difficulty,
            mechanics: e.mechanics,
            is_bodyweight: e.is_bodyweight,
            unilateral: e.unilateral,
            video_url: e.video_url,
            image_keys: e.image_keys,
            is_custom: e.is_custom,
            created_by: e.created_by,
            category_id: e.category_id,
            notes: e.notes,
            muscle_group_ids: e.muscle_group_ids,
            equipment_ids: e.equipment_ids,
            created_at: e.created_at,
            updated_at: e.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WorkoutExerciseDto {
    pub exercise_id: Uuid,
    pub position: i32,
    pub sets: i32,
    pub reps: Option<i32>,
    pub duration_seconds: Option<i32>,
    pub rest_seconds: Option<i32>,
    pub notes: Option<String>,
}

impl From<db::WorkoutExerciseEntry> for WorkoutExerciseDto {
    fn from(e: db::WorkoutExerciseEntry) -> Self {
        Self {
            exercise_id: e.exercise_id,
            position: e.position,
            sets: e.sets,
            reps: e.reps,
            duration_seconds: e.duration_seconds,
            rest_seconds: e.rest_seconds,
            notes: e.notes,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct WorkoutDto {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub difficulty: Option<String>,
    pub estimated_duration_minutes: Option<i32>,
    pub calories_burn_estimate: Option<i32>,
    pub is_public: bool,
    pub is_template: bool,
    pub created_by: Uuid,
    pub exercises: Vec<WorkoutExerciseDto>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<db::Workout> for WorkoutDto {
    fn from(w: db::Workout) -> Self {
        Self {
            id: w.id,
            name: w.name,
            description: w.description,
            difficulty: w.difficulty,
            estimated_duration_minutes: w.estimated_duration_minutes,
            calories_burn_estimate: w.calories_burn_estimate,
            is_public: w.is_public,
            is_template: w.is_template,
            created_by: w.created_by,
            exercises: w.exercises.into_iter().map(Into::into).collect(),
            created_at: w.created_at,
            updated_at: w.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PlanEntryDto {
    pub workout_id: Uuid,
    pub week_number: i32,
    pub day_number: i32,
}

impl From<db::PlanEntry> for PlanEntryDto {
    fn from(e: db::PlanEntry) -> Self {
        Self {
            workout_id: e.workout_id,
            week_number: e.week_number,
            day_number: e.day_number,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct WorkoutPlanDto {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub duration_weeks: i32,
    pub difficulty: Option<String>,
    pub is_public: bool,
    pub created_by: Uuid,
    pub entries: Vec<PlanEntryDto>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<db::WorkoutPlan> for WorkoutPlanDto {
    fn from(p: db::WorkoutPlan) -> Self {
        Self {
            id: p.id,
            name: p.name,
            description: p.description,
            duration_weeks: p.duration_weeks,
            difficulty: p.difficulty,
            is_public: p.is_public,
            created_by: p.created_by,
            entries: p.entries.into_iter().map(Into::into).collect(),
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SessionDto {
    pub id: Uuid,
    pub user_id: Uuid,
    pub workout_id: Uuid,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub status: String,
    pub notes: Option<String>,
    pub total_duration_seconds: Option<i64>,
    pub calories_burned: Option<i32>,
    pub mood_rating: Option<i32>,
    pub difficulty_rating: Option<i32>,
    pub created_at: String,
}

impl From<db::WorkoutSession> for SessionDto {
    fn from(s: db::WorkoutSession) -> Self {
        Self {
            id: s.id,
            user_id: s.user_id,
            workout_id: s.workout_id,
            start_time: s.start_time,
            end_time: s.end_time,
            status: s.status,
            notes: s.notes,
            total_duration_seconds: s.total_duration_seconds,
            calories_burned: s.calories_burned,
            mood_rating: s.mood_rating,
            difficulty_rating: s.difficulty_rating,
            created_at: s.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SubscriptionDto {
    pub plan_name: String,
    pub plan_type: String,
    pub price_cents: i32,
    pub is_active: bool,
    pub current_period_end: Option<String>,
    pub cancel_at_period_end: bool,
}
