/// Database models
///
/// Each record type carries its own SQL and an [`entity::Entity`] descriptor
/// used by the generic entity service.
///
/// # Models
///
/// - `user`: Back-office accounts and roles
/// - `company`: Client companies and their credentials
/// - `area`: Organizational areas
/// - `task`: Work items linking a company, an area and an assignee
/// - `custom_filter`: Saved listing filters

pub mod area;
pub mod company;
pub mod custom_filter;
pub mod entity;
pub mod patch;
pub mod task;
pub mod user;
