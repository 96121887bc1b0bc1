/// Middleware for the API server
///
/// - `cors`: Cross-origin policy built from configuration
/// - `security`: Security response headers
///
/// Session authentication lives next to the router in `app`.

pub mod cors;
pub mod security;
