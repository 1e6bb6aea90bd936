use crate::entities::prelude::*;
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Schema;
use uuid::Uuid;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// name, type, description, price in cents, stripe price id
const PLANS: &[(&str, &str, &str, i32, Option<&str>)] = &[
    ("Free Plan", "free", "Basic fitness tracking features", 0, None),
    (
        "Plus Plan",
        "plus",
        "Advanced features with more workout storage",
        999,
        Some("price_plus_monthly"),
    ),
    (
        "Pro Plan",
        "pro",
        "Unlimited features with priority support",
        1999,
        Some("price_pro_monthly"),
    ),
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let schema = Schema::new(backend);

        manager
            .create_table(
                schema
                    .create_table_from_entity(Plans)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Subscriptions)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        let now = chrono::Utc::now().to_rfc3339();

        for (name, plan_type, description, price_cents, stripe_price_id) in PLANS {
            let insert = Query::insert()
                .into_table(Plans)
                .columns([
                    crate::entities::plans::Column::Id,
                    crate::entities::plans::Column::Name,
                    crate::entities::plans::Column::PlanType,
                    crate::entities::plans::Column::Description,
                    crate::entities::plans::Column::PriceCents,
                    crate::entities::plans::Column::StripePriceId,
                    crate::entities::plans::Column::CreatedAt,
                ])
                .values_panic([
                    Uuid::new_v4().into(),
                    (*name).into(),
                    (*plan_type).into(),
                    (*description).into(),
                    (*price_cents).into(),
                    stripe_price_id.map(ToString::to_string).into(),
                    now.clone().into(),
                ])
                .to_owned();
            manager.exec_stmt(insert).await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Subscriptions).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Plans).to_owned())
            .await?;

        Ok(())
    }
}
