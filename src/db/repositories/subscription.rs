use anyhow::{Context, Result};
use chrono::{TimeZone, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use uuid::Uuid;

use crate::entities::{plans, subscriptions};
use crate::models::PlanType;

pub use crate::entities::plans::Model as Plan;
pub use crate::entities::subscriptions::Model as Subscription;

/// Subscription state carried by a Stripe `customer.subscription.*` event.
#[derive(Debug, Clone)]
pub struct StripeSubscriptionState {
    pub stripe_subscription_id: String,
    pub stripe_customer_id: Option<String>,
    pub price_id: Option<String>,
    pub is_active: bool,
    pub current_period_start: Option<i64>,
    pub current_period_end: Option<i64>,
    pub cancel_at_period_end: bool,
}

fn epoch_to_rfc3339(epoch: Option<i64>) -> Option<String> {
    epoch.and_then(|ts| Utc.timestamp_opt(ts, 0).single().map(|dt| dt.to_rfc3339()))
}

pub struct SubscriptionRepository {
    conn: DatabaseConnection,
}

impl SubscriptionRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn plan_by_type(&self, plan_type: PlanType) -> Result<Option<Plan>> {
        Ok(plans::Entity::find()
            .filter(plans::Column::PlanType.eq(plan_type.as_str()))
            .one(&self.conn)
            .await
            .context("Failed to query plan by type")?)
    }

    pub async fn plan_by_stripe_price(&self, price_id: &str) -> Result<Option<Plan>> {
        Ok(plans::Entity::find()
            .filter(plans::Column::StripePriceId.eq(price_id))
            .one(&self.conn)
            .await
            .context("Failed to query plan by price id")?)
    }

    pub async fn plan_by_id(&self, id: Uuid) -> Result<Option<Plan>> {
        Ok(plans::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query plan")?)
    }

    /// The user's active subscription with its plan, if any.
    pub async fn active_for_user(&self, user_id: Uuid) -> Result<Option<(Subscription, Plan)>> {
        let Some(subscription) = subscriptions::Entity::find()
            .filter(subscriptions::Column::UserId.eq(user_id))
            .filter(subscriptions::Column::IsActive.eq(true))
            .one(&self.conn)
            .await
            .context("Failed to query active subscription")?
        else {
            return Ok(None);
        };

        let plan = plans::Entity::find_by_id(subscription.plan_id)
            .one(&self.conn)
            .await
            .context("Failed to query subscription plan")?
            .ok_or_else(|| anyhow::anyhow!("Subscription references missing plan"))?;

        Ok(Some((subscription, plan)))
    }

    pub async fn find_by_stripe_subscription(&self, id: &str) -> Result<Option<Subscription>> {
        Ok(subscriptions::Entity::find()
            .filter(subscriptions::Column::StripeSubscriptionId.eq(id))
            .one(&self.conn)
            .await
            .context("Failed to query subscription by stripe id")?)
    }

    pub async fn find_by_stripe_customer(&self, id: &str) -> Result<Option<Subscription>> {
        Ok(subscriptions::Entity::find()
            .filter(subscriptions::Column::StripeCustomerId.eq(id))
            .one(&self.conn)
            .await
            .context("Failed to query subscription by customer id")?)
    }

    /// Apply the state carried by a Stripe subscription event.
    ///
    /// The row is matched by stripe subscription id, falling back to customer
    /// id (the id changes when a customer re-subscribes). Events for unknown
    /// customers are skipped; rows are created at checkout, not here.
    pub async fn apply_stripe_state(&self, state: StripeSubscriptionState) -> Result<bool> {
        let existing = match self
            .find_by_stripe_subscription(&state.stripe_subscription_id)
            .await?
        {
            Some(sub) => Some(sub),
            None => match &state.stripe_customer_id {
                Some(customer_id) => self.find_by_stripe_customer(customer_id).await?,
                None => None,
            },
        };

        let Some(subscription) = existing else {
            return Ok(false);
        };

        let plan_id = match &state.price_id {
            Some(price_id) => self
                .plan_by_stripe_price(price_id)
                .await?
                .map(|p| p.id),
            None => None,
        };

        let mut active: subscriptions::ActiveModel = subscription.into();
        active.stripe_subscription_id = Set(Some(state.stripe_subscription_id));
        if let Some(customer_id) = state.stripe_customer_id {
            active.stripe_customer_id = Set(Some(customer_id));
        }
        if let Some(plan_id) = plan_id {
            active.plan_id = Set(plan_id);
        }
        active.is_active = Set(state.is_active);
        active.current_period_start = Set(epoch_to_rfc3339(state.current_period_start));
        active.current_period_end = Set(epoch_to_rfc3339(state.current_period_end));
        active.cancel_at_period_end = Set(state.cancel_at_period_end);
        active.updated_at = Set(Utc::now().to_rfc3339());
        active.update(&self.conn).await?;

        Ok(true)
    }

    /// Create a subscription row directly (used by tests and checkout flows).
    pub async fn create(
        &self,
        user_id: Uuid,
        plan_id: Uuid,
        stripe_subscription_id: Option<String>,
        stripe_customer_id: Option<String>,
    ) -> Result<Subscription> {
        let now = Utc::now().to_rfc3339();

        Ok(subscriptions::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            plan_id: Set(plan_id),
            stripe_subscription_id: Set(stripe_subscription_id),
            stripe_customer_id: Set(stripe_customer_id),
            is_active: Set(true),
            current_period_start: Set(None),
            current_period_end: Set(None),
            cancel_at_period_end: Set(false),
            created_at: Set(now.clone()),
            updated_at: Set(now),
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert subscription")?)
    }

    pub async fn set_active_by_stripe_subscription(
        &self,
        stripe_subscription_id: &str,
        is_active: bool,
    ) -> Result<Option<Subscription>> {
        let Some(subscription) = self
            .find_by_stripe_subscription(stripe_subscription_id)
            .await?
        else {
            return Ok(None);
        };

        let mut active: subscriptions::ActiveModel = subscription.into();
        active.is_active = Set(is_active);
        active.updated_at = Set(Utc::now().to_rfc3339());
        Ok(Some(active.update(&self.conn).await?))
    }
}
