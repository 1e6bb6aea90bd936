use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use tokio::task;
use uuid::Uuid;

use crate::config::SecurityConfig;
use crate::entities::users;

/// User data returned from the repository (without the password hash)
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub full_name: Option<String>,
    pub is_active: bool,
    pub is_superuser: bool,
    pub timezone: Option<String>,
    pub preferred_units: Option<String>,
    pub locale: Option<String>,
    pub height_cm: Option<f32>,
    pub weight_kg: Option<f32>,
    pub date_of_birth: Option<String>,
    pub fitness_goal: Option<String>,
    pub training_experience: Option<String>,
    pub training_frequency: Option<i32>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            username: model.username,
            full_name: model.full_name,
            is_active: model.is_active,
            is_superuser: model.is_superuser,
            timezone: model.timezone,
            preferred_units: model.preferred_units,
            locale: model.locale,
            height_cm: model.height_cm,
            weight_kg: model.weight_kg,
            date_of_birth: model.date_of_birth,
            fitness_goal: model.fitness_goal,
            training_experience: model.training_experience,
            training_frequency: model.training_frequency,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Fields accepted when creating a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub password: String,
    pub full_name: Option<String>,
    pub height_cm: Option<f32>,
    pub weight_kg: Option<f32>,
    pub date_of_birth: Option<String>,
    pub fitness_goal: Option<String>,
    pub training_experience: Option<String>,
    pub training_frequency: Option<i32>,
}

/// Profile fields a user may change about themselves.
/// Protected columns (id, password hash, is_superuser) are simply absent.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub full_name: Option<String>,
    pub timezone: Option<String>,
    pub preferred_units: Option<String>,
    pub locale: Option<String>,
    pub height_cm: Option<f32>,
    pub weight_kg: Option<f32>,
    pub date_of_birth: Option<String>,
    pub fitness_goal: Option<String>,
    pub training_experience: Option<String>,
    pub training_frequency: Option<i32>,
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let user = users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user by ID")?;

        Ok(user.map(User::from))
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query user by username")?;

        Ok(user.map(User::from))
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query user by email")?;

        Ok(user.map(User::from))
    }

    pub async fn exists_by_email(&self, email: &str) -> Result<bool> {
        let count = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .count(&self.conn)
            .await
            .context("Failed to count users by email")?;

        Ok(count > 0)
    }

    pub async fn exists_by_username(&self, username: &str) -> Result<bool> {
        let count = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .count(&self.conn)
            .await
            .context("Failed to count users by username")?;

        Ok(count > 0)
    }

    /// Insert a new user, hashing the password off the async runtime.
    pub async fn create(&self, input: NewUser, config: &SecurityConfig) -> Result<User> {
        let password = input.password.clone();
        let config = config.clone();
        let password_hash = task::spawn_blocking(move || hash_password(&password, Some(&config)))
            .await
            .context("Password hashing task panicked")??;

        let now = chrono::Utc::now().to_rfc3339();

        let active = users::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(input.email),
            username: Set(input.username),
            password_hash: Set(password_hash),
            full_name: Set(input.full_name),
            is_active: Set(true),
            is_superuser: Set(false),
            timezone: Set(None),
            preferred_units: Set(None),
            locale: Set(None),
            height_cm: Set(input.height_cm),
            weight_kg: Set(input.weight_kg),
            date_of_birth: Set(input.date_of_birth),
            fitness_goal: Set(input.fitness_goal),
            training_experience: Set(input.training_experience),
            training_frequency: Set(input.training_frequency),
            created_at: Set(now.clone()),
            updated_at: Set(now),
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to insert user")?;

        Ok(User::from(model))
    }

    /// Verify password for a user.
    /// Runs in `spawn_blocking` because Argon2 verification is CPU-intensive
    /// and would stall the async runtime if run directly.
    pub async fn verify_password(&self, username: &str, password: &str) -> Result<bool> {
        let user = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query user for password verification")?;

        let Some(user) = user else {
            return Ok(false);
        };

        let password_hash = user.password_hash;
        let password = password.to_string();

        let is_valid = task::spawn_blocking(move || {
            let parsed_hash = PasswordHash::new(&password_hash)
                .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

            let argon2 = Argon2::default();
            Ok::<bool, anyhow::Error>(
                argon2
                    .verify_password(password.as_bytes(), &parsed_hash)
                    .is_ok(),
            )
        })
        .await
        .context("Password verification task panicked")??;

        Ok(is_valid)
    }

    /// Update password for a user (hashes the new password)
    pub async fn update_password(
        &self,
        username: &str,
        new_password: &str,
        config: &SecurityConfig,
    ) -> Result<()> {
        let user = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query user for password update")?
            .ok_or_else(|| anyhow::anyhow!("User not found: {username}"))?;

        let password = new_password.to_string();
        let config = config.clone();
        let new_hash = task::spawn_blocking(move || hash_password(&password, Some(&config)))
            .await
            .context("Password hashing task panicked")??;

        let now = chrono::Utc::now().to_rfc3339();

        let mut active: users::ActiveModel = user.into();
        active.password_hash = Set(new_hash);
        active.updated_at = Set(now);
        active.update(&self.conn).await?;

        Ok(())
    }

    /// Apply a profile update. Only fields present in the update are touched.
    pub async fn update_profile(&self, id: Uuid, update: UserUpdate) -> Result<Option<User>> {
        let Some(user) = users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user for profile update")?
        else {
            return Ok(None);
        };

        let mut active: users::ActiveModel = user.into();

        if let Some(full_name) = update.full_name {
            active.full_name = Set(Some(full_name));
        }
        if let Some(timezone) = update.timezone {
            active.timezone = Set(Some(timezone));
        }
        if let Some(units) = update.preferred_units {
            active.preferred_units = Set(Some(units));
        }
        if let Some(locale) = update.locale {
            active.locale = Set(Some(locale));
        }
        if let Some(height) = update.height_cm {
            active.height_cm = Set(Some(height));
        }
        if let Some(weight) = update.weight_kg {
            active.weight_kg = Set(Some(weight));
        }
        if let Some(dob) = update.date_of_birth {
            active.date_of_birth = Set(Some(dob));
        }
        if let Some(goal) = update.fitness_goal {
            active.fitness_goal = Set(Some(goal));
        }
        if let Some(experience) = update.training_experience {
            active.training_experience = Set(Some(experience));
        }
        if let Some(frequency) = update.training_frequency {
            active.training_frequency = Set(Some(frequency));
        }

        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let model = active.update(&self.conn).await?;
        Ok(Some(User::from(model)))
    }

    /// Search over email, username and full name. Newest accounts first.
    pub async fn list(
        &self,
        search: Option<&str>,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<User>> {
        let mut query = users::Entity::find();

        if let Some(term) = search {
            let pattern = format!("%{term}%");
            query = query.filter(
                Condition::any()
                    .add(users::Column::Email.like(&pattern))
                    .add(users::Column::Username.like(&pattern))
                    .add(users::Column::FullName.like(&pattern)),
            );
        }

        let models = query
            .order_by_desc(users::Column::CreatedAt)
            .limit(limit)
            .offset(offset)
            .all(&self.conn)
            .await
            .context("Failed to list users")?;

        Ok(models.into_iter().map(User::from).collect())
    }

    pub async fn set_active(&self, id: Uuid, is_active: bool) -> Result<bool> {
        let Some(user) = users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user for activation change")?
        else {
            return Ok(false);
        };

        let mut active: users::ActiveModel = user.into();
        active.is_active = Set(is_active);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active.update(&self.conn).await?;

        Ok(true)
    }
}

/// Hash a password using Argon2id with optional custom params.
pub fn hash_password(password: &str, config: Option<&SecurityConfig>) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let argon2 = if let Some(cfg) = config {
        let params = Params::new(
            cfg.argon2_memory_cost_kib,
            cfg.argon2_time_cost,
            cfg.argon2_parallelism,
            None, // output length (use default)
        )
        .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
    } else {
        Argon2::default()
    };

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}
