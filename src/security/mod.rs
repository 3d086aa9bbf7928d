//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → rate_limit.rs (per-IP token bucket, optional)
//!     → user_rate_limit.rs (per-user fixed window on API routes)
//!     → auth.rs extractors (Bearer token → user) on protected handlers
//!
//! Token issuing:
//!     → password.rs (Argon2 verify)
//!     → jwt.rs (signed access token)
//! ```
//!
//! # Design Decisions
//! - Limiters fail open when their backend is unavailable
//! - Authentication failures never reveal which check failed beyond the documented messages

pub mod auth;
pub mod jwt;
pub mod password;
pub mod rate_limit;
pub mod user_rate_limit;

pub use auth::{authenticate, ActiveUser, CurrentUser};
pub use jwt::{AuthError, Claims, TokenService};
pub use password::{hash_password, verify_password};
pub use rate_limit::IpRateLimiter;
pub use user_rate_limit::UserRateLimiter;
