//! # StartupMate
//!
//! HTTP backend that accepts a startup idea or a pitch-deck upload, produces
//! a structured analysis, validates it against a fixed schema and keeps it in
//! a document store. Stored analyses can be listed back as reports, and a
//! contact form is accepted and stored.
//!
//! ```text
//! ┌──────────┐   ┌────────────┐   ┌──────────────┐   ┌──────────┐
//! │  server  │──▶│  handlers  │──▶│ analysis +   │──▶│  Store<T> │
//! │  (axum)  │   │            │   │ schema check │   │ (SQLite) │
//! └──────────┘   └────────────┘   └──────────────┘   └──────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML + environment configuration |
//! | [`handlers`] | Request orchestration (validate, analyze, persist) |
//! | [`server`] | HTTP routes and error contract |
//! | [`sqlite_store`] | SQLite document backend |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |
//! | [`reports`] | `reports` CLI command |
//! | [`telemetry`] | Logging setup |
//!
//! Schemas, document kinds, analysis stubs and the storage abstraction live
//! in [`startupmate_core`], re-exported here.

pub mod config;
pub mod db;
pub mod handlers;
pub mod migrate;
pub mod reports;
pub mod server;
pub mod sqlite_store;
pub mod telemetry;

pub use startupmate_core;
