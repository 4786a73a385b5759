//! Model portal server library
//!
//! Exposes the internal modules for the binary and the end-to-end tests.

pub mod badges;
pub mod catalog_store;
pub mod config;
pub mod identity;
pub mod recommendation;
pub mod server;
pub mod sqlite_persistence;
pub mod tracking;
pub mod user;

pub use server::{run_server, RequestsLoggingLevel};
