use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "workouts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub name: String,

    pub description: Option<String>,

    /// "beginner", "intermediate" or "advanced"
    pub difficulty: Option<String>,

    pub estimated_duration_minutes: Option<i32>,

    pub calories_burn_estimate: Option<i32>,

    pub is_public: bool,

    /// Templates do not count against plan limits
    pub is_template: bool,

    pub created_by: Uuid,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::CreatedBy",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Users,
    #[sea_orm(has_many = "super::workout_exercises::Entity")]
    WorkoutExercises,
    #[sea_orm(has_many = "super::workout_sessions::Entity")]
    WorkoutSessions,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::workout_exercises::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WorkoutExercises.def()
    }
}

impl Related<super::workout_sessions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WorkoutSessions.def()
    }
}

impl Related<super::workout_plans::Entity> for Entity {
    fn to() -> RelationDef {
        super::workout_plan_workouts::Relation::Plan.def()
    }
    fn via() -> Option<RelationDef> {
        Some(super::workout_plan_workouts::Relation::Workout.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
