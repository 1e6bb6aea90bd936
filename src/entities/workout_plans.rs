use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "workout_plans")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub name: String,

    pub description: Option<String>,

    pub duration_weeks: i32,

    pub difficulty: Option<String>,

    pub is_public: bool,

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
    #[sea_orm(has_many = "super::workout_plan_workouts::Entity")]
    WorkoutPlanWorkouts,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::workouts::Entity> for Entity {
    fn to() -> RelationDef {
        super::workout_plan_workouts::Relation::Workout.def()
    }
    fn via() -> Option<RelationDef> {
        Some(super::workout_plan_workouts::Relation::Plan.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
