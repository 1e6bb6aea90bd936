use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "workout_exercises")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub workout_id: Uuid,

    pub exercise_id: Uuid,

    /// 1-based position within the workout
    pub position: i32,

    pub sets: i32,

    pub reps: Option<i32>,

    pub duration_seconds: Option<i32>,

    pub rest_seconds: Option<i32>,

    pub notes: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::workouts::Entity",
        from = "Column::WorkoutId",
        to = "super::workouts::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Workout,
    #[sea_orm(
        belongs_to = "super::exercises::Entity",
        from = "Column::ExerciseId",
        to = "super::exercises::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Exercise,
}

impl Related<super::workouts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Workout.def()
    }
}

impl Related<super::exercises::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Exercise.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
