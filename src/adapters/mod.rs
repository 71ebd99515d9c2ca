//! Adapters - Implementations of port interfaces.
//!
//! - `auth` - Argon2 password hashing and JWT access tokens
//! - `broadcast` - In-process per-post comment fan-out
//! - `memory` - In-memory storage backend with transactional semantics
//! - `postgres` - PostgreSQL storage backend

pub mod auth;
pub mod broadcast;
pub mod memory;
pub mod postgres;
