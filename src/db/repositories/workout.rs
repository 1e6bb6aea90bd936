use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::entities::{workout_exercises, workout_plan_workouts, workout_plans, workouts};

/// Workout with its ordered exercise entries.
#[derive(Debug, Clone)]
pub struct Workout {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub difficulty: Option<String>,
    pub estimated_duration_minutes: Option<i32>,
    pub calories_burn_estimate: Option<i32>,
    pub is_public: bool,
    pub is_template: bool,
    pub created_by: Uuid,
    pub exercises: Vec<WorkoutExerciseEntry>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone)]
pub struct WorkoutExerciseEntry {
    pub exercise_id: Uuid,
    pub position: i32,
    pub sets: i32,
    pub reps: Option<i32>,
    pub duration_seconds: Option<i32>,
    pub rest_seconds: Option<i32>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewWorkout {
    pub name: String,
    pub description: Option<String>,
    pub difficulty: Option<String>,
    pub estimated_duration_minutes: Option<i32>,
    pub calories_burn_estimate: Option<i32>,
    pub is_public: bool,
    pub is_template: bool,
    pub created_by: Uuid,
    pub exercises: Vec<WorkoutExerciseEntry>,
}

/// Workout plan with its scheduled workouts.
#[derive(Debug, Clone)]
pub struct WorkoutPlan {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub duration_weeks: i32,
    pub difficulty: Option<String>,
    pub is_public: bool,
    pub created_by: Uuid,
    pub entries: Vec<PlanEntry>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone)]
pub struct PlanEntry {
    pub workout_id: Uuid,
    pub week_number: i32,
    pub day_number: i32,
}

#[derive(Debug, Clone)]
pub struct NewWorkoutPlan {
    pub name: String,
    pub description: Option<String>,
    pub duration_weeks: i32,
    pub difficulty: Option<String>,
    pub is_public: bool,
    pub created_by: Uuid,
    pub entries: Vec<PlanEntry>,
}

fn map_workout(model: workouts::Model, entries: Vec<WorkoutExerciseEntry>) -> Workout {
    Workout {
        id: model.id,
        name: model.name,
        description: model.description,
        difficulty: model.difficulty,
        estimated_duration_minutes: model.estimated_duration_minutes,
        calories_burn_estimate: model.calories_burn_estimate,
        is_public: model.is_public,
        is_template: model.is_template,
        created_by: model.created_by,
        exercises: entries,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

fn map_plan(model: workout_plans::Model, entries: Vec<PlanEntry>) -> WorkoutPlan {
    WorkoutPlan {
        id: model.id,
        name: model.name,
        description: model.description,
        duration_weeks: model.duration_weeks,
        difficulty: model.difficulty,
        is_public: model.is_public,
        created_by: model.created_by,
        entries,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

pub struct WorkoutRepository {
    conn: DatabaseConnection,
}

impl WorkoutRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(&self, input: NewWorkout) -> Result<Workout> {
        let now = chrono::Utc::now().to_rfc3339();
        let id = Uuid::new_v4();

        let txn = self.conn.begin().await?;

        let active = workouts::ActiveModel {
            id: Set(id),
            name: Set(input.name),
            description: Set(input.description),
            difficulty: Set(input.difficulty),
            estimated_duration_minutes: Set(input.estimated_duration_minutes),
            calories_burn_estimate: Set(input.calories_burn_estimate),
            is_public: Set(input.is_public),
            is_template: Set(input.is_template),
            created_by: Set(input.created_by),
            created_at: Set(now.clone()),
            updated_at: Set(now),
        };

        let model = active
            .insert(&txn)
            .await
            .context("Failed to insert workout")?;

        for entry in &input.exercises {
            workout_exercises::ActiveModel {
                id: Set(Uuid::new_v4()),
                workout_id: Set(id),
                exercise_id: Set(entry.exercise_id),
                position: Set(entry.position),
                sets: Set(entry.sets),
                reps: Set(entry.reps),
                duration_seconds: Set(entry.duration_seconds),
                rest_seconds: Set(entry.rest_seconds),
                notes: Set(entry.notes.clone()),
            }
            .insert(&txn)
            .await
            .context("Failed to insert workout exercise")?;
        }

        txn.commit().await?;

        Ok(map_workout(model, input.exercises))
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Workout>> {
        let Some(model) = workouts::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query workout")?
        else {
            return Ok(None);
        };

        let entries = self.exercise_entries_for(id).await?;
        Ok(Some(map_workout(model, entries)))
    }

    async fn exercise_entries_for(&self, workout_id: Uuid) -> Result<Vec<WorkoutExerciseEntry>> {
        Ok(workout_exercises::Entity::find()
            .filter(workout_exercises::Column::WorkoutId.eq(workout_id))
            .order_by_asc(workout_exercises::Column::Position)
            .all(&self.conn)
            .await
            .context("Failed to query workout exercises")?
            .into_iter()
            .map(|m| WorkoutExerciseEntry {
                exercise_id: m.exercise_id,
                position: m.position,
                sets: m.sets,
                reps: m.reps,
                duration_seconds: m.duration_seconds,
                rest_seconds: m.rest_seconds,
                notes: m.notes,
            })
            .collect())
    }

    /// Workouts the user created, plus public ones when `include_public`.
    pub async fn list(
        &self,
        user_id: Uuid,
        include_public: bool,
        difficulty: Option<&str>,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<Workout>> {
        let mut condition = Condition::any().add(workouts::Column::CreatedBy.eq(user_id));
        if include_public {
            condition = condition.add(workouts::Column::IsPublic.eq(true));
        }

        let mut query = workouts::Entity::find().filter(condition);
        if let Some(difficulty) = difficulty {
            query = query.filter(workouts::Column::Difficulty.eq(difficulty));
        }

        let models = query
            .order_by_desc(workouts::Column::CreatedAt)
            .limit(limit)
            .offset(offset)
            .all(&self.conn)
            .await
            .context("Failed to list workouts")?;

        let mut result = Vec::with_capacity(models.len());
        for model in models {
            let entries = self.exercise_entries_for(model.id).await?;
            result.push(map_workout(model, entries));
        }

        Ok(result)
    }

    /// Non-template workouts created by the user; plan limits count these.
    pub async fn count_owned(&self, user_id: Uuid) -> Result<u64> {
        Ok(workouts::Entity::find()
            .filter(workouts::Column::CreatedBy.eq(user_id))
            .filter(workouts::Column::IsTemplate.eq(false))
            .count(&self.conn)
            .await
            .context("Failed to count workouts")?)
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let Some(model) = workouts::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query workout for delete")?
        else {
            return Ok(false);
        };

        model.delete(&self.conn).await?;
        Ok(true)
    }

    pub async fn create_plan(&self, input: NewWorkoutPlan) -> Result<WorkoutPlan> {
        let now = chrono::Utc::now().to_rfc3339();
        let id = Uuid::new_v4();

        let txn = self.conn.begin().await?;

        let active = workout_plans::ActiveModel {
            id: Set(id),
            name: Set(input.name),
            description: Set(input.description),
            duration_weeks: Set(input.duration_weeks),
            difficulty: Set(input.difficulty),
            is_public: Set(input.is_public),
            created_by: Set(input.created_by),
            created_at: Set(now.clone()),
            updated_at: Set(now),
        };

        let model = active
            .insert(&txn)
            .await
            .context("Failed to insert workout plan")?;

        for entry in &input.entries {
            workout_plan_workouts::ActiveModel {
                id: Set(Uuid::new_v4()),
                plan_id: Set(id),
                workout_id: Set(entry.workout_id),
                week_number: Set(entry.week_number),
                day_number: Set(entry.day_number),
            }
            .insert(&txn)
            .await
            .context("Failed to insert plan entry")?;
        }

        txn.commit().await?;

        Ok(map_plan(model, input.entries))
    }

    pub async fn get_plan(&self, id: Uuid) -> Result<Option<WorkoutPlan>> {
        let Some(model) = workout_plans::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query workout plan")?
        else {
            return Ok(None);
        };

        let entries = self.plan_entries_for(id).await?;
        Ok(Some(map_plan(model, entries)))
    }

    async fn plan_entries_for(&self, plan_id: Uuid) -> Result<Vec<PlanEntry>> {
        Ok(workout_plan_workouts::Entity::find()
            .filter(workout_plan_workouts::Column::PlanId.eq(plan_id))
            .order_by_asc(workout_plan_workouts::Column::WeekNumber)
            .order_by_asc(workout_plan_workouts::Column::DayNumber)
            .all(&self.conn)
            .await
            .context("Failed to query plan entries")?
            .into_iter()
            .map(|m| PlanEntry {
                workout_id: m.workout_id,
                week_number: m.week_number,
                day_number: m.day_number,
            })
            .collect())
    }

    pub async fn list_plans(
        &self,
        user_id: Uuid,
        include_public: bool,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<WorkoutPlan>> {
        let mut condition = Condition::any().add(workout_plans::Column::CreatedBy.eq(user_id));
        if include_public {
            condition = condition.add(workout_plans::Column::IsPublic.eq(true));
        }

        let models = workout_plans::Entity::find()
            .filter(condition)
            .order_by_desc(workout_plans::Column::CreatedAt)
            .limit(limit)
            .offset(offset)
            .all(&self.conn)
            .await
            .context("Failed to list workout plans")?;

        let mut result = Vec::with_capacity(models.len());
        for model in models {
            let entries = self.plan_entries_for(model.id).await?;
            result.push(map_plan(model, entries));
        }

        Ok(result)
    }

    pub async fn count_plans_owned(&self, user_id: Uuid) -> Result<u64> {
        Ok(workout_plans::Entity::find()
            .filter(workout_plans::Column::CreatedBy.eq(user_id))
            .count(&self.conn)
            .await
            .context("Failed to count workout plans")?)
    }
}
