//! # gatehouse-auth
//!
//! The authentication core of Gatehouse.
//!
//! ## Modules
//!
//! - `token` — signed token creation and verification for all four kinds
//! - `password` — Argon2id hashing and strength policy enforcement
//! - `lockout` — the account lock state machine
//! - `authz` — role/permission table and cross-role management rules
//! - `session` — the per-device session registry and expiry sweep

pub mod authz;
pub mod lockout;
pub mod password;
pub mod session;
pub mod token;

pub use authz::{AccessControl, Permission};
pub use lockout::{AccountState, LockoutPolicy};
pub use password::{PasswordHasher, PasswordPolicy, PasswordStrength};
pub use session::{SessionCleanup, SessionRegistry};
pub use token::{Claims, TokenDecoder, TokenEncoder, TokenError, TokenKind};
