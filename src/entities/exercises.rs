use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "exercises")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(unique)]
    pub name: String,

    pub description: Option<String>,

    pub instructions: Option<String>,

    /// "beginner", "intermediate", "advanced" or "expert"
    pub difficulty: String,

    /// "compound" or "isolation"
    pub mechanics: Option<String>,

    pub is_bodyweight: bool,

    pub unilateral: bool,

    pub video_url: Option<String>,

    /// JSON array of S3 object keys
    pub image_keys: Option<String>,

    pub is_custom: bool,

    pub created_by: Option<Uuid>,

    pub category_id: Uuid,

    pub notes: Option<String>,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::exercise_categories::Entity",
        from = "Column::CategoryId",
        to = "super::exercise_categories::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    ExerciseCategories,
    #[sea_orm(has_many = "super::exercise_muscle_groups::Entity")]
    ExerciseMuscleGroups,
    #[sea_orm(has_many = "super::exercise_equipment::Entity")]
    ExerciseEquipment,
    #[sea_orm(has_many = "super::workout_exercises::Entity")]
    WorkoutExercises,
}

impl Related<super::exercise_categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ExerciseCategories.def()
    }
}

impl Related<super::muscle_groups::Entity> for Entity {
    fn to() -> RelationDef {
        super::exercise_muscle_groups::Relation::MuscleGroup.def()
    }
    fn via() -> Option<RelationDef> {
        Some(
            super::exercise_muscle_groups::Relation::Exercise
                .def()
                .rev(),
        )
    }
}

impl Related<super::equipment::Entity> for Entity {
    fn to() -> RelationDef {
        super::exercise_equipment::Relation::Equipment.def()
    }
    fn via() -> Option<RelationDef> {
        Some(super::exercise_equipment::Relation::Exercise.def().rev())
    }
}

impl Related<super::workout_exercises::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WorkoutExercises.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
