pub mod audit;
pub mod dashboards;
pub mod profiles;
pub mod template_dashboards;
