use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use crate::entities::workout_sessions;
use crate::models::SessionStatus;

pub use crate::entities::workout_sessions::Model as WorkoutSession;

/// Ratings and notes recorded when a session ends.
#[derive(Debug, Clone, Default)]
pub struct SessionCompletion {
    pub notes: Option<String>,
    pub calories_burned: Option<i32>,
    pub mood_rating: Option<i32>,
    pub difficulty_rating: Option<i32>,
}

pub struct SessionRepository {
    conn: DatabaseConnection,
}

impl SessionRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<WorkoutSession>> {
        Ok(workout_sessions::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query workout session")?)
    }

    /// The user's current in-progress session, if any.
    pub async fn active_for_user(&self, user_id: Uuid) -> Result<Option<WorkoutSession>> {
        Ok(workout_sessions::Entity::find()
            .filter(workout_sessions::Column::UserId.eq(user_id))
            .filter(workout_sessions::Column::Status.eq(SessionStatus::InProgress.as_str()))
            .one(&self.conn)
            .await
            .context("Failed to query active session")?)
    }

    pub async fn start(&self, user_id: Uuid, workout_id: Uuid) -> Result<WorkoutSession> {
        let now = Utc::now().to_rfc3339();

        let active = workout_sessions::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            workout_id: Set(workout_id),
            start_time: Set(Some(now.clone())),
            end_time: Set(None),
            status: Set(SessionStatus::InProgress.as_str().to_string()),
            notes: Set(None),
            total_duration_seconds: Set(None),
            calories_burned: Set(None),
            mood_rating: Set(None),
            difficulty_rating: Set(None),
            created_at: Set(now.clone()),
            updated_at: Set(now),
        };

        Ok(active
            .insert(&self.conn)
            .await
            .context("Failed to insert workout session")?)
    }

    /// Finish a session with the given terminal status. Duration is derived
    /// from the recorded start time.
    pub async fn finish(
        &self,
        session: WorkoutSession,
        status: SessionStatus,
        completion: SessionCompletion,
    ) -> Result<WorkoutSession> {
        let now = Utc::now();

        let duration_seconds = session
            .start_time
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|start| (now - start.with_timezone(&Utc)).num_seconds().max(0));

        let mut active: workout_sessions::ActiveModel = session.into();
        active.end_time = Set(Some(now.to_rfc3339()));
        active.status = Set(status.as_str().to_string());
        active.total_duration_seconds = Set(duration_seconds);
        if let Some(notes) = completion.notes {
            active.notes = Set(Some(notes));
        }
        if let Some(calories) = completion.calories_burned {
            active.calories_burned = Set(Some(calories));
        }
        if let Some(mood) = completion.mood_rating {
            active.mood_rating = Set(Some(mood));
        }
        if let Some(difficulty) = completion.difficulty_rating {
            active.difficulty_rating = Set(Some(difficulty));
        }
        active.updated_at = Set(now.to_rfc3339());

        Ok(active.update(&self.conn).await?)
    }

    pub async fn list_for_user(
        &self,
        user_id: Uuid,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<WorkoutSession>> {
        Ok(workout_sessions::Entity::find()
            .filter(workout_sessions::Column::UserId.eq(user_id))
            .order_by_desc(workout_sessions::Column::CreatedAt)
            .limit(limit)
            .offset(offset)
            .all(&self.conn)
            .await
            .context("Failed to list workout sessions")?)
    }
}
