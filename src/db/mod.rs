use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

use crate::models::{PlanType, SessionStatus};

pub mod migrator;
pub mod repositories;

pub use repositories::exercise::{Exercise, ExerciseFilter, ExerciseUpdate, NewExercise};
pub use repositories::session::{SessionCompletion, WorkoutSession};
pub use repositories::subscription::{Plan, StripeSubscriptionState, Subscription};
pub use repositories::user::{NewUser, User, UserUpdate};
pub use repositories::workout::{
    NewWorkout, NewWorkoutPlan, PlanEntry, Workout, WorkoutExerciseEntry, WorkoutPlan,
};

pub use crate::entities::{equipment, exercise_categories, muscle_groups};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn exercise_repo(&self) -> repositories::exercise::ExerciseRepository {
        repositories::exercise::ExerciseRepository::new(self.conn.clone())
    }

    fn workout_repo(&self) -> repositories::workout::WorkoutRepository {
        repositories::workout::WorkoutRepository::new(self.conn.clone())
    }

    fn session_repo(&self) -> repositories::session::SessionRepository {
        repositories::session::SessionRepository::new(self.conn.clone())
    }

    fn subscription_repo(&self) -> repositories::subscription::SubscriptionRepository {
        repositories::subscription::SubscriptionRepository::new(self.conn.clone())
    }

    // ========== User Repository Methods ==========

    pub async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.user_repo().get_by_username(username).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.user_repo().get_by_email(email).await
    }

    pub async fn user_exists_by_email(&self, email: &str) -> Result<bool> {
        self.user_repo().exists_by_email(email).await
    }

    pub async fn user_exists_by_username(&self, username: &str) -> Result<bool> {
        self.user_repo().exists_by_username(username).await
    }

    pub async fn create_user(
        &self,
        input: NewUser,
        config: &crate::config::SecurityConfig,
    ) -> Result<User> {
        self.user_repo().create(input, config).await
    }

    pub async fn verify_user_password(&self, username: &str, password: &str) -> Result<bool> {
        self.user_repo().verify_password(username, password).await
    }

    pub async fn update_user_password(
        &self,
        username: &str,
        new_password: &str,
        config: &crate::config::SecurityConfig,
    ) -> Result<()> {
        self.user_repo()
            .update_password(username, new_password, config)
            .await
    }

    pub async fn update_user_profile(&self, id: Uuid, update: UserUpdate) -> Result<Option<User>> {
        self.user_repo().update_profile(id, update).await
    }

    pub async fn list_users(
        &self,
        search: Option<&str>,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<User>> {
        self.user_repo().list(search, limit, offset).await
    }

    pub async fn set_user_active(&self, id: Uuid, is_active: bool) -> Result<bool> {
        self.user_repo().set_active(id, is_active).await
    }

    // ========== Exercise Repository Methods ==========

    pub async fn exercise_category_exists(&self, id: Uuid) -> Result<bool> {
        self.exercise_repo().category_exists(id).await
    }

    pub async fn missing_muscle_groups(&self, ids: &[Uuid]) -> Result<Vec<Uuid>> {
        self.exercise_repo().missing_muscle_groups(ids).await
    }

    pub async fn missing_equipment(&self, ids: &[Uuid]) -> Result<Vec<Uuid>> {
        self.exercise_repo().missing_equipment(ids).await
    }

    pub async fn exercise_name_exists(&self, name: &str) -> Result<bool> {
        self.exercise_repo().name_exists(name).await
    }

    pub async fn create_exercise(&self, input: NewExercise) -> Result<Exercise> {
        self.exercise_repo().create(input).await
    }

    pub async fn get_exercise(&self, id: Uuid) -> Result<Option<Exercise>> {
        self.exercise_repo().get(id).await
    }

    pub async fn list_exercises(
        &self,
        filter: &ExerciseFilter,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<Exercise>> {
        self.exercise_repo().list(filter, limit, offset).await
    }

    pub async fn update_exercise(
        &self,
        id: Uuid,
        update: ExerciseUpdate,
    ) -> Result<Option<Exercise>> {
        self.exercise_repo().update(id, update).await
    }

    pub async fn delete_exercise(&self, id: Uuid) -> Result<bool> {
        self.exercise_repo().delete(id).await
    }

    pub async fn set_exercise_image_keys(&self, id: Uuid, keys: &[String]) -> Result<bool> {
        self.exercise_repo().set_image_keys(id, keys).await
    }

    pub async fn list_exercise_categories(&self) -> Result<Vec<exercise_categories::Model>> {
        self.exercise_repo().list_categories().await
    }

    pub async fn list_muscle_groups(&self) -> Result<Vec<muscle_groups::Model>> {
        self.exercise_repo().list_muscle_groups().await
    }

    pub async fn list_equipment(&self) -> Result<Vec<equipment::Model>> {
        self.exercise_repo().list_equipment().await
    }

    // ========== Workout Repository Methods ==========

    pub async fn create_workout(&self, input: NewWorkout) -> Result<Workout> {
        self.workout_repo().create(input).await
    }

    pub async fn get_workout(&self, id: Uuid) -> Result<Option<Workout>> {
        self.workout_repo().get(id).await
    }

    pub async fn list_workouts(
        &self,
        user_id: Uuid,
        include_public: bool,
        difficulty: Option<&str>,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<Workout>> {
        self.workout_repo()
            .list(user_id, include_public, difficulty, limit, offset)
            .await
    }

    pub async fn count_workouts_owned(&self, user_id: Uuid) -> Result<u64> {
        self.workout_repo().count_owned(user_id).await
    }

    pub async fn delete_workout(&self, id: Uuid) -> Result<bool> {
        self.workout_repo().delete(id).await
    }

    pub async fn create_workout_plan(&self, input: NewWorkoutPlan) -> Result<WorkoutPlan> {
        self.workout_repo().create_plan(input).await
    }

    pub async fn get_workout_plan(&self, id: Uuid) -> Result<Option<WorkoutPlan>> {
        self.workout_repo().get_plan(id).await
    }

    pub async fn list_workout_plans(
        &self,
        user_id: Uuid,
        include_public: bool,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<WorkoutPlan>> {
        self.workout_repo()
            .list_plans(user_id, include_public, limit, offset)
            .await
    }

    pub async fn count_workout_plans_owned(&self, user_id: Uuid) -> Result<u64> {
        self.workout_repo().count_plans_owned(user_id).await
    }

    // ========== Session Repository Methods ==========

    pub async fn get_session(&self, id: Uuid) -> Result<Option<WorkoutSession>> {
        self.session_repo().get(id).await
    }

    pub async fn active_session_for_user(&self, user_id: Uuid) -> Result<Option<WorkoutSession>> {
        self.session_repo().active_for_user(user_id).await
    }

    pub async fn start_session(&self, user_id: Uuid, workout_id: Uuid) -> Result<WorkoutSession> {
        self.session_repo().start(user_id, workout_id).await
    }

    pub async fn finish_session(
        &self,
        session: WorkoutSession,
        status: SessionStatus,
        completion: SessionCompletion,
    ) -> Result<WorkoutSession> {
        self.session_repo()
            .finish(session, status, completion)
            .await
    }

    pub async fn list_sessions_for_user(
        &self,
        user_id: Uuid,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<WorkoutSession>> {
        self.session_repo()
            .list_for_user(user_id, limit, offset)
            .await
    }

    // ========== Subscription Repository Methods ==========

    pub async fn get_plan_by_type(&self, plan_type: PlanType) -> Result<Option<Plan>> {
        self.subscription_repo().plan_by_type(plan_type).await
    }

    pub async fn get_plan(&self, id: Uuid) -> Result<Option<Plan>> {
        self.subscription_repo().plan_by_id(id).await
    }

    pub async fn active_subscription_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Option<(Subscription, Plan)>> {
        self.subscription_repo().active_for_user(user_id).await
    }

    pub async fn apply_stripe_subscription_state(
        &self,
        state: StripeSubscriptionState,
    ) -> Result<bool> {
        self.subscription_repo().apply_stripe_state(state).await
    }

    pub async fn create_subscription(
        &self,
        user_id: Uuid,
        plan_id: Uuid,
        stripe_subscription_id: Option<String>,
        stripe_customer_id: Option<String>,
    ) -> Result<Subscription> {
        self.subscription_repo()
            .create(user_id, plan_id, stripe_subscription_id, stripe_customer_id)
            .await
    }

    pub async fn set_subscription_active_by_stripe_id(
        &self,
        stripe_subscription_id: &str,
        is_active: bool,
    ) -> Result<Option<Subscription>> {
        self.subscription_repo()
            .set_active_by_stripe_subscription(stripe_subscription_id, is_active)
            .await
    }
}
