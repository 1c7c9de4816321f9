//! Password-reset request entity.

pub mod model;

pub use model::PasswordResetRequest;
