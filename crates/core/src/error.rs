use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    /// A widget overlaps another widget or leaves the dashboard grid.
    #[error("Invalid widget placement: {0}")]
    Placement(String),

    /// A widget field references an entity that is missing or not visible.
    #[error("Invalid reference: {0}")]
    Reference(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Message used for every permission failure on dashboard ids so callers
/// cannot probe which ids exist.
pub const NO_PERMISSIONS: &str = "No permissions to referred object or it does not exist!";

impl CoreError {
    /// The uniform permission error for dashboards that are missing or not
    /// editable by the caller.
    pub fn no_permissions() -> Self {
        CoreError::Forbidden(NO_PERMISSIONS.to_string())
    }
}
