//! Discussion Core - Threaded discussion backend
//!
//! Users publish posts; other users attach comments that may reply to any
//! earlier comment on the same post, forming reply trees of unbounded
//! depth. Post owners decide whether new comments are accepted.
//!
//! # Architecture
//!
//! This crate follows hexagonal architecture:
//! - `domain` - Entities, the comment tree assembler, and shared primitives
//! - `ports` - Repository, unit-of-work, comment feed and credential traits
//! - `adapters` - In-memory and PostgreSQL storage, the broadcaster, auth
//! - `application` - Services and the transaction boundary
//! - `app` - Startup wiring for the configured backend

pub mod adapters;
pub mod app;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod telemetry;
