use sea_orm_migration::prelude::*;

mod m20250810_initial;
mod m20250902_seed_billing_plans;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250810_initial::Migration),
            Box::new(m20250902_seed_billing_plans::Migration),
        ]
    }
}
