pub use super::equipment::Entity as Equipment;
pub use super::exercise_categories::Entity as ExerciseCategories;
pub use super::exercise_equipment::Entity as ExerciseEquipment;
pub use super::exercise_muscle_groups::Entity as ExerciseMuscleGroups;
pub use super::exercises::Entity as Exercises;
pub use super::muscle_groups::Entity as MuscleGroups;
pub use super::plans::Entity as Plans;
pub use super::subscriptions::Entity as Subscriptions;
pub use super::users::Entity as Users;
pub use super::workout_exercises::Entity as WorkoutExercises;
pub use super::workout_plan_workouts::Entity as WorkoutPlanWorkouts;
pub use super::workout_plans::Entity as WorkoutPlans;
pub use super::workout_sessions::Entity as WorkoutSessions;
pub use super::workouts::Entity as Workouts;
