//! Well-known role name constants.
//!
//! These must match the values accepted by the `users.role` check constraint.

pub const ROLE_SUPER_ADMIN: &str = "super_admin";
pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_USER: &str = "user";
