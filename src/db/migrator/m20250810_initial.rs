use crate::entities::prelude::*;
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Schema;
use uuid::Uuid;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Taxonomy rows every installation starts with.
const CATEGORIES: &[(&str, &str)] = &[
    ("Strength", "Resistance training against external load"),
    ("Cardio", "Sustained aerobic work"),
    ("Flexibility", "Stretching and mobility work"),
    ("Balance", "Stability and proprioception work"),
];

const MUSCLE_GROUPS: &[&str] = &[
    "Chest",
    "Back",
    "Shoulders",
    "Biceps",
    "Triceps",
    "Forearms",
    "Quadriceps",
    "Hamstrings",
    "Glutes",
    "Calves",
    "Core",
];

const EQUIPMENT: &[&str] = &[
    "Barbell",
    "Dumbbell",
    "Kettlebell",
    "Resistance Band",
    "Pull-up Bar",
    "Bench",
    "Cable Machine",
    "Bodyweight",
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let schema = Schema::new(backend);

        manager
            .create_table(
                schema
                    .create_table_from_entity(Users)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(ExerciseCategories)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(MuscleGroups)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Equipment)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Exercises)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(ExerciseMuscleGroups)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(ExerciseEquipment)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Workouts)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(WorkoutExercises)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(WorkoutPlans)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(WorkoutPlanWorkouts)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(WorkoutSessions)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // Seed taxonomy
        let now = chrono::Utc::now().to_rfc3339();

        for (name, description) in CATEGORIES {
            let insert = Query::insert()
                .into_table(ExerciseCategories)
                .columns([
                    crate::entities::exercise_categories::Column::Id,
                    crate::entities::exercise_categories::Column::Name,
                    crate::entities::exercise_categories::Column::Description,
                    crate::entities::exercise_categories::Column::CreatedAt,
                ])
                .values_panic([
                    Uuid::new_v4().into(),
                    (*name).into(),
                    (*description).into(),
                    now.clone().into(),
                ])
                .to_owned();
            manager.exec_stmt(insert).await?;
        }

        for name in MUSCLE_GROUPS {
            let insert = Query::insert()
                .into_table(MuscleGroups)
                .columns([
                    crate::entities::muscle_groups::Column::Id,
                    crate::entities::muscle_groups::Column::Name,
                    crate::entities::muscle_groups::Column::CreatedAt,
                ])
                .values_panic([Uuid::new_v4().into(), (*name).into(), now.clone().into()])
                .to_owned();
            manager.exec_stmt(insert).await?;
        }

        for name in EQUIPMENT {
            let insert = Query::insert()
                .into_table(Equipment)
                .columns([
                    crate::entities::equipment::Column::Id,
                    crate::entities::equipment::Column::Name,
                    crate::entities::equipment::Column::CreatedAt,
                ])
                .values_panic([Uuid::new_v4().into(), (*name).into(), now.clone().into()])
                .to_owned();
            manager.exec_stmt(insert).await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(WorkoutSessions).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(WorkoutPlanWorkouts).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(WorkoutPlans).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(WorkoutExercises).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Workouts).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ExerciseEquipment).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ExerciseMuscleGroups).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Exercises).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Equipment).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(MuscleGroups).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ExerciseCategories).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users).to_owned())
            .await?;

        Ok(())
    }
}
