//! Subscription tier feature gates.
//!
//! Limits are enforced at creation time against a static per-tier table.
//! Users without an active subscription get the free tier.

use thiserror::Error;
use uuid::Uuid;

use crate::db::Store;
use crate::models::PlanType;

#[derive(Debug, Error)]
pub enum LimitError {
    /// The action requires a higher subscription tier.
    #[error("{0}")]
    UpgradeRequired(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for LimitError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// What a tier allows. `None` means unlimited.
#[derive(Debug, Clone, Copy)]
pub struct PlanFeatures {
    pub max_workouts: Option<u64>,
    pub max_plans: Option<u64>,
    pub custom_exercises: bool,
    pub analytics: bool,
    pub export_data: bool,
}

#[must_use]
pub const fn features_for(plan_type: PlanType) -> PlanFeatures {
    match plan_type {
        PlanType::Free => PlanFeatures {
            max_workouts: Some(10),
            max_plans: Some(2),
            custom_exercises: false,
            analytics: false,
            export_data: false,
        },
        PlanType::Plus => PlanFeatures {
            max_workouts: Some(50),
            max_plans: Some(10),
            custom_exercises: true,
            analytics: true,
            export_data: false,
        },
        PlanType::Pro => PlanFeatures {
            max_workouts: None,
            max_plans: None,
            custom_exercises: true,
            analytics: true,
            export_data: true,
        },
    }
}

pub struct PlanLimitService {
    store: Store,
}

impl PlanLimitService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    /// The user's current tier, falling back to free.
    pub async fn plan_type_for_user(&self, user_id: Uuid) -> Result<PlanType, LimitError> {
        let Some((_, plan)) = self.store.active_subscription_for_user(user_id).await? else {
            return Ok(PlanType::Free);
        };

        Ok(plan.plan_type.parse().unwrap_or(PlanType::Free))
    }

    pub async fn features_for_user(&self, user_id: Uuid) -> Result<PlanFeatures, LimitError> {
        Ok(features_for(self.plan_type_for_user(user_id).await?))
    }

    pub async fn check_custom_exercise_permission(&self, user_id: Uuid) -> Result<(), LimitError> {
        let features = self.features_for_user(user_id).await?;
        if !features.custom_exercises {
            return Err(LimitError::UpgradeRequired(
                "Custom exercises require a Plus or Pro subscription".to_string(),
            ));
        }
        Ok(())
    }

    pub async fn check_workout_limit(&self, user_id: Uuid) -> Result<(), LimitError> {
        let features = self.features_for_user(user_id).await?;
        let Some(max) = features.max_workouts else {
            return Ok(());
        };

        let owned = self.store.count_workouts_owned(user_id).await?;
        if owned >= max {
            return Err(LimitError::UpgradeRequired(format!(
                "Workout limit reached ({max}). Upgrade your plan to create more."
            )));
        }
        Ok(())
    }

    pub async fn check_plan_limit(&self, user_id: Uuid) -> Result<(), LimitError> {
        let features = self.features_for_user(user_id).await?;
        let Some(max) = features.max_plans else {
            return Ok(());
        };

        let owned = self.store.count_workout_plans_owned(user_id).await?;
        if owned >= max {
            return Err(LimitError::UpgradeRequired(format!(
                "Workout plan limit reached ({max}). Upgrade your plan to create more."
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_tier_is_capped() {
        let features = features_for(PlanType::Free);
        assert_eq!(features.max_workouts, Some(10));
        assert_eq!(features.max_plans, Some(2));
        assert!(!features.custom_exercises);
        assert!(!features.analytics);
    }

    #[test]
    fn plus_tier_unlocks_custom_exercises() {
        let features = features_for(PlanType::Plus);
        assert_eq!(features.max_workouts, Some(50));
        assert!(features.custom_exercises);
        assert!(features.analytics);
        assert!(!features.export_data);
    }

    #[test]
    fn pro_tier_is_unlimited() {
        let features = features_for(PlanType::Pro);
        assert_eq!(features.max_workouts, None);
        assert_eq!(features.max_plans, None);
        assert!(features.export_data);
    }
}
