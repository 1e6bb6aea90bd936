use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(unique)]
    pub email: String,

    #[sea_orm(unique)]
    pub username: String,

    /// Argon2id password hash
    pub password_hash: String,

    pub full_name: Option<String>,

    pub is_active: bool,

    pub is_superuser: bool,

    pub timezone: Option<String>,

    /// "metric" or "imperial"
    pub preferred_units: Option<String>,

    pub locale: Option<String>,

    pub height_cm: Option<f32>,

    pub weight_kg: Option<f32>,

    pub date_of_birth: Option<String>,

    pub fitness_goal: Option<String>,

    pub training_experience: Option<String>,

    /// Sessions per week the user aims for
    pub training_frequency: Option<i32>,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::workouts::Entity")]
    Workouts,
    #[sea_orm(has_many = "super::workout_sessions::Entity")]
    WorkoutSessions,
    #[sea_orm(has_many = "super::subscriptions::Entity")]
    Subscriptions,
}

impl Related<super::workouts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Workouts.def()
    }
}

impl Related<super::workout_sessions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WorkoutSessions.def()
    }
}

impl Related<super::subscriptions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Subscriptions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
