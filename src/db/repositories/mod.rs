pub mod exercise;
pub mod session;
pub mod subscription;
pub mod user;
pub mod workout;
