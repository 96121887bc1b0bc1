/// API route handlers
///
/// Organized by resource:
///
/// - `health`: Health check
/// - `auth`: Login, logout, current session
/// - `companies`, `areas`, `tasks`, `users`, `custom_filters`: Back-office records
///
/// Handlers authorize the caller, call the matching service and map the
/// result; they hold no business rules of their own.

use serde::Serialize;
use uuid::Uuid;

pub mod areas;
pub mod auth;
pub mod companies;
pub mod custom_filters;
pub mod health;
pub mod tasks;
pub mod users;

/// Body returned by every delete endpoint
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub message: String,
    pub id: Uuid,
}

impl DeleteResponse {
    pub fn new(message: impl Into<String>, id: Uuid) -> Self {
        Self {
            message: message.into(),
            id,
        }
    }
}
