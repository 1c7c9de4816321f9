//! # gatehouse-service
//!
//! Business logic service layer for Gatehouse. Each service orchestrates
//! stores, the token engine, the lockout policy, and the audit trail to
//! implement application-level use cases.
//!
//! Services follow constructor injection — all dependencies are provided
//! at construction time via `Arc` references.

pub mod audit;
pub mod auth;
pub mod context;
pub mod notification;
pub mod user;

pub use audit::AuditService;
pub use auth::{AuthService, LoginOutcome};
pub use context::RequestContext;
pub use notification::TracingMailer;
pub use user::{AdminUserService, UserService};
