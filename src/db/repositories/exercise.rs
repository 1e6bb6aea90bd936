use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::entities::{
    equipment, exercise_categories, exercise_equipment, exercise_muscle_groups, exercises,
    muscle_groups,
};

/// Catalog exercise with its resolved taxonomy links.
#[derive(Debug, Clone)]
pub struct Exercise {
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

fn parse_image_keys(raw: Option<&str>) -> Vec<String> {
    raw.and_then(|s| serde_json::from_str(s).ok())
        .unwrap_or_default()
}

fn map_model(
    model: exercises::Model,
    muscle_group_ids: Vec<Uuid>,
    equipment_ids: Vec<Uuid>,
) -> Exercise {
    Exercise {
        id: model.id,
        name: model.name,
        description: model.description,
        instructions: model.instructions,
        difficulty: model.difficulty,
        mechanics: model.mechanics,
        is_bodyweight: model.is_bodyweight,
        unilateral: model.unilateral,
        video_url: model.video_url,
        image_keys: parse_image_keys(model.image_keys.as_deref()),
        is_custom: model.is_custom,
        created_by: model.created_by,
        category_id: model.category_id,
        notes: model.notes,
        muscle_group_ids,
        equipment_ids,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

#[derive(Debug, Clone)]
pub struct NewExercise {
    pub name: String,
    pub description: Option<String>,
    pub instructions: Option<String>,
    pub difficulty: String,
    pub mechanics: Option<String>,
    pub is_bodyweight: bool,
    pub unilateral: bool,
    pub video_url: Option<String>,
    pub is_custom: bool,
    pub created_by: Option<Uuid>,
    pub category_id: Uuid,
    pub notes: Option<String>,
    pub muscle_group_ids: Vec<Uuid>,
    pub equipment_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Default)]
pub struct ExerciseUpdate {
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

#[derive(Debug, Clone, Default)]
pub struct ExerciseFilter {
    pub category_id: Option<Uuid>,
    pub difficulty: Option<String>,
    pub muscle_group_id: Option<Uuid>,
    pub equipment_id: Option<Uuid>,
    pub include_custom: bool,
}

pub struct ExerciseRepository {
    conn: DatabaseConnection,
}

impl ExerciseRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn category_exists(&self, id: Uuid) -> Result<bool> {
        let count = exercise_categories::Entity::find_by_id(id)
            .count(&self.conn)
            .await
            .context("Failed to query exercise category")?;
        Ok(count > 0)
    }

    /// Returns the subset of the given muscle group ids that do NOT exist.
    pub async fn missing_muscle_groups(&self, ids: &[Uuid]) -> Result<Vec<Uuid>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let found: Vec<Uuid> = muscle_groups::Entity::find()
            .filter(muscle_groups::Column::Id.is_in(ids.iter().copied()))
            .all(&self.conn)
            .await
            .context("Failed to query muscle groups")?
            .into_iter()
            .map(|m| m.id)
            .collect();

        Ok(ids.iter().copied().filter(|id| !found.contains(id)).collect())
    }

    /// Returns the subset of the given equipment ids that do NOT exist.
    pub async fn missing_equipment(&self, ids: &[Uuid]) -> Result<Vec<Uuid>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let found: Vec<Uuid> = equipment::Entity::find()
            .filter(equipment::Column::Id.is_in(ids.iter().copied()))
            .all(&self.conn)
            .await
            .context("Failed to query equipment")?
            .into_iter()
            .map(|m| m.id)
            .collect();

        Ok(ids.iter().copied().filter(|id| !found.contains(id)).collect())
    }

    pub async fn name_exists(&self, name: &str) -> Result<bool> {
        let count = exercises::Entity::find()
            .filter(exercises::Column::Name.eq(name))
            .count(&self.conn)
            .await
            .context("Failed to query exercise by name")?;
        Ok(count > 0)
    }

    pub async fn create(&self, input: NewExercise) -> Result<Exercise> {
        let now = chrono::Utc::now().to_rfc3339();
        let id = Uuid::new_v4();

        let txn = self.conn.begin().await?;

        let active = exercises::ActiveModel {
            id: Set(id),
            name: Set(input.name),
            description: Set(input.description),
            instructions: Set(input.instructions),
            difficulty: Set(input.difficulty),
            mechanics: Set(input.mechanics),
            is_bodyweight: Set(input.is_bodyweight),
            unilateral: Set(input.unilateral),
            video_url: Set(input.video_url),
            image_keys: Set(None),
            is_custom: Set(input.is_custom),
            created_by: Set(input.created_by),
            category_id: Set(input.category_id),
            notes: Set(input.notes),
            created_at: Set(now.clone()),
            updated_at: Set(now),
        };

        let model = active
            .insert(&txn)
            .await
            .context("Failed to insert exercise")?;

        for mg_id in &input.muscle_group_ids {
            exercise_muscle_groups::ActiveModel {
                exercise_id: Set(id),
                muscle_group_id: Set(*mg_id),
                is_primary: Set(false),
            }
            .insert(&txn)
            .await
            .context("Failed to link muscle group")?;
        }

        for eq_id in &input.equipment_ids {
            exercise_equipment::ActiveModel {
                exercise_id: Set(id),
                equipment_id: Set(*eq_id),
            }
            .insert(&txn)
            .await
            .context("Failed to link equipment")?;
        }

        txn.commit().await?;

        Ok(map_model(model, input.muscle_group_ids, input.equipment_ids))
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Exercise>> {
        let Some(model) = exercises::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query exercise")?
        else {
            return Ok(None);
        };

        let muscle_group_ids = self.muscle_group_ids_for(id).await?;
        let equipment_ids = self.equipment_ids_for(id).await?;

        Ok(Some(map_model(model, muscle_group_ids, equipment_ids)))
    }

    async fn muscle_group_ids_for(&self, exercise_id: Uuid) -> Result<Vec<Uuid>> {
        Ok(exercise_muscle_groups::Entity::find()
            .filter(exercise_muscle_groups::Column::ExerciseId.eq(exercise_id))
            .all(&self.conn)
            .await
            .context("Failed to query exercise muscle groups")?
            .into_iter()
            .map(|m| m.muscle_group_id)
            .collect())
    }

    async fn equipment_ids_for(&self, exercise_id: Uuid) -> Result<Vec<Uuid>> {
        Ok(exercise_equipment::Entity::find()
            .filter(exercise_equipment::Column::ExerciseId.eq(exercise_id))
            .all(&self.conn)
            .await
            .context("Failed to query exercise equipment")?
            .into_iter()
            .map(|m| m.equipment_id)
            .collect())
    }

    pub async fn list(
        &self,
        filter: &ExerciseFilter,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<Exercise>> {
        let mut query = exercises::Entity::find();

        if let Some(category_id) = filter.category_id {
            query = query.filter(exercises::Column::CategoryId.eq(category_id));
        }
        if let Some(ref difficulty) = filter.difficulty {
            query = query.filter(exercises::Column::Difficulty.eq(difficulty.as_str()));
        }
        if !filter.include_custom {
            query = query.filter(exercises::Column::IsCustom.eq(false));
        }

        if let Some(mg_id) = filter.muscle_group_id {
            let ids: Vec<Uuid> = exercise_muscle_groups::Entity::find()
                .filter(exercise_muscle_groups::Column::MuscleGroupId.eq(mg_id))
                .all(&self.conn)
                .await?
                .into_iter()
                .map(|m| m.exercise_id)
                .collect();
            query = query.filter(exercises::Column::Id.is_in(ids));
        }

        if let Some(eq_id) = filter.equipment_id {
            let ids: Vec<Uuid> = exercise_equipment::Entity::find()
                .filter(exercise_equipment::Column::EquipmentId.eq(eq_id))
                .all(&self.conn)
                .await?
                .into_iter()
                .map(|m| m.exercise_id)
                .collect();
            query = query.filter(exercises::Column::Id.is_in(ids));
        }

        let models = query
            .order_by_asc(exercises::Column::Name)
            .limit(limit)
            .offset(offset)
            .all(&self.conn)
            .await
            .context("Failed to list exercises")?;

        let mut result = Vec::with_capacity(models.len());
        for model in models {
            let id = model.id;
            let muscle_group_ids = self.muscle_group_ids_for(id).await?;
            let equipment_ids = self.equipment_ids_for(id).await?;
            result.push(map_model(model, muscle_group_ids, equipment_ids));
        }

        Ok(result)
    }

    pub async fn update(&self, id: Uuid, update: ExerciseUpdate) -> Result<Option<Exercise>> {
        let Some(model) = exercises::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query exercise for update")?
        else {
            return Ok(None);
        };

        let txn = self.conn.begin().await?;

        let mut active: exercises::ActiveModel = model.into();

        if let Some(name) = update.name {
            active.name = Set(name);
        }
        if let Some(description) = update.description {
            active.description = Set(Some(description));
        }
        if let Some(instructions) = update.instructions {
            active.instructions = Set(Some(instructions));
        }
        if let Some(difficulty) = update.difficulty {
            active.difficulty = Set(difficulty);
        }
        if let Some(mechanics) = update.mechanics {
            active.mechanics = Set(Some(mechanics));
        }
        if let Some(video_url) = update.video_url {
            active.video_url = Set(Some(video_url));
        }
        if let Some(notes) = update.notes {
            active.notes = Set(Some(notes));
        }
        if let Some(category_id) = update.category_id {
            active.category_id = Set(category_id);
        }
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let model = active.update(&txn).await?;

        if let Some(muscle_group_ids) = &update.muscle_group_ids {
            exercise_muscle_groups::Entity::delete_many()
                .filter(exercise_muscle_groups::Column::ExerciseId.eq(id))
                .exec(&txn)
                .await?;
            for mg_id in muscle_group_ids {
                exercise_muscle_groups::ActiveModel {
                    exercise_id: Set(id),
                    muscle_group_id: Set(*mg_id),
                    is_primary: Set(false),
                }
                .insert(&txn)
                .await?;
            }
        }

        if let Some(equipment_ids) = &update.equipment_ids {
            exercise_equipment::Entity::delete_many()
                .filter(exercise_equipment::Column::ExerciseId.eq(id))
                .exec(&txn)
                .await?;
            for eq_id in equipment_ids {
                exercise_equipment::ActiveModel {
                    exercise_id: Set(id),
                    equipment_id: Set(*eq_id),
                }
                .insert(&txn)
                .await?;
            }
        }

        txn.commit().await?;

        let muscle_group_ids = self.muscle_group_ids_for(id).await?;
        let equipment_ids = self.equipment_ids_for(id).await?;
        Ok(Some(map_model(model, muscle_group_ids, equipment_ids)))
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let Some(model) = exercises::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query exercise for delete")?
        else {
            return Ok(false);
        };

        model.delete(&self.conn).await?;
        Ok(true)
    }

    /// Replace the stored image key list.
    pub async fn set_image_keys(&self, id: Uuid, keys: &[String]) -> Result<bool> {
        let Some(model) = exercises::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query exercise for image update")?
        else {
            return Ok(false);
        };

        let mut active: exercises::ActiveModel = model.into();
        active.image_keys = Set(Some(serde_json::to_string(keys)?));
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active.update(&self.conn).await?;

        Ok(true)
    }

    pub async fn list_categories(&self) -> Result<Vec<exercise_categories::Model>> {
        Ok(exercise_categories::Entity::find()
            .order_by_asc(exercise_categories::Column::Name)
            .all(&self.conn)
            .await
            .context("Failed to list exercise categories")?)
    }

    pub async fn list_muscle_groups(&self) -> Result<Vec<muscle_groups::Model>> {
        Ok(muscle_groups::Entity::find()
            .order_by_asc(muscle_groups::Column::Name)
            .all(&self.conn)
            .await
            .context("Failed to list muscle groups")?)
    }

    pub async fn list_equipment(&self) -> Result<Vec<equipment::Model>> {
        Ok(equipment::Entity::find()
            .order_by_asc(equipment::Column::Name)
            .all(&self.conn)
            .await
            .context("Failed to list equipment")?)
    }
}
