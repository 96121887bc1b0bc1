//! # Rios shared library
//!
//! Domain core of the Rios back office: records, storage, authentication,
//! the role policy and the entity services the HTTP API is built on.
//!
//! ## Module Organization
//!
//! - `models`: Records, their SQL and entity descriptors
//! - `db`: Connection pool, migrations and the store abstraction
//! - `auth`: Passwords, session tokens and authorization
//! - `service`: Entity services and login
//! - `seed`: Startup seeding

pub mod auth;
pub mod db;
pub mod models;
pub mod seed;
pub mod service;

/// Current version of the shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
