//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&mut PgConnection` as the first argument.

pub mod audit_repo;
pub mod dashboard_repo;
pub mod entity_repo;
pub mod profile_repo;
pub mod widget_field_repo;
pub mod widget_repo;

pub use audit_repo::AuditLogRepo;
pub use dashboard_repo::{DashboardRepo, ShareTable};
pub use entity_repo::EntityRepo;
pub use profile_repo::ProfileRepo;
pub use widget_field_repo::WidgetFieldRepo;
pub use widget_repo::WidgetRepo;
