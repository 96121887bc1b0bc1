/// Authentication and authorization
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing
/// - [`jwt`]: Session token signing and verification
/// - [`middleware`]: Cookie extraction and `AuthContext`
/// - [`authorization`]: Per-action role allow-sets and task ownership

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
