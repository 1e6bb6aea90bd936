pub mod auth_service;
pub mod auth_service_impl;
pub use auth_service::{AuthError, AuthService, TokenPair};
pub use auth_service_impl::SeaOrmAuthService;

pub mod token;
pub use token::{TokenError, TokenKind, TokenService};

pub mod plan_limits;
pub use plan_limits::{LimitError, PlanFeatures, PlanLimitService, features_for};
