//! User entity and role enumeration.

pub mod model;
pub mod role;

pub use model::{LoginFailure, User, UserSearchFilter, UserSortField, UserStats};
pub use role::Role;
