pub mod enums;

pub use enums::{Difficulty, PlanType, SessionStatus};
