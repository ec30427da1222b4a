//! Authentication: JWT access tokens, Argon2id passwords, role extractors.

pub mod handlers;
pub mod jwt;
pub mod middleware;
pub mod password;

pub use jwt::{Claims, TokenKeys};
pub use middleware::{AuthUser, RequireAdmin, RequireFleetManager, RequireStaff};
