//! # Database Crate
//!
//! A high-level, application-specific interface to the PostgreSQL database
//! (spec §6.4): the system's permanent archive for compliance state,
//! per-bot optimizer state, and the bot map itself.
//!
//! ## Architectural Principles
//!
//! - **Adapter:** encapsulates all database-specific logic behind a clean
//!   API, hiding the underlying SQL.
//! - **Asynchronous & Pooled:** every operation is async and shares one
//!   `PgPool` connection pool.
//! - **Tagged-union JSON:** every persisted payload is `jsonb` carrying a
//!   `version` tag; readers accept any version the current Rust type can
//!   deserialize.
//!
//! ## Public API
//!
//! - `connect`/`run_migrations`: establish the pool and apply migrations.
//! - `DbRepository`: the struct providing all data access methods.
//! - `DbError`: this crate's error type.

// Declare the modules that constitute this crate.
pub mod connection;
pub mod error;
pub mod repository;

// Re-export the key components to create a clean, public-facing API.
pub use connection::{connect, run_migrations};
pub use error::DbError;
pub use repository::DbRepository;