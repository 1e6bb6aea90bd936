use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "exercise_muscle_groups")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub exercise_id: Uuid,

    #[sea_orm(primary_key, auto_increment = false)]
    pub muscle_group_id: Uuid,

    /// Primary mover vs assisting muscle
    pub is_primary: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::exercises::Entity",
        from = "Column::ExerciseId",
        to = "super::exercises::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Exercise,
    #[sea_orm(
        belongs_to = "super::muscle_groups::Entity",
        from = "Column::MuscleGroupId",
        to = "super::muscle_groups::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    MuscleGroup,
}

impl Related<super::exercises::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Exercise.def()
    }
}

impl Related<super::muscle_groups::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MuscleGroup.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
