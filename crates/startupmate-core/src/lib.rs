//! # StartupMate Core
//!
//! Framework-free logic for StartupMate: document models and their declared
//! schemas, the schema validator, the deterministic analysis functions, and
//! the document store abstraction.
//!
//! This crate contains no tokio, sqlx, HTTP, or filesystem dependencies.
//! Storage engines plug in through [`store::DocumentBackend`].

pub mod analysis;
pub mod models;
pub mod schema;
pub mod store;
