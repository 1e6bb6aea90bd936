pub mod prelude;

pub mod equipment;
pub mod exercise_categories;
pub mod exercise_equipment;
pub mod exercise_muscle_groups;
pub mod exercises;
pub mod muscle_groups;
pub mod plans;
pub mod subscriptions;
pub mod users;
pub mod workout_exercises;
pub mod workout_plan_workouts;
pub mod workout_plans;
pub mod workout_sessions;
pub mod workouts;
