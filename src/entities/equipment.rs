use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "equipment")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(unique)]
    pub name: String,

    pub description: Option<String>,

    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::exercise_equipment::Entity")]
    ExerciseEquipment,
}

impl Related<super::exercises::Entity> for Entity {
    fn to() -> RelationDef {
        super::exercise_equipment::Relation::Exercise.def()
    }
    fn via() -> Option<RelationDef> {
        Some(super::exercise_equipment::Relation::Equipment.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
