//! # Storage Module
//!
//! Optional persistence for vault records. An engine without a store keeps
//! everything in memory; an engine with one writes every committed change
//! through before it becomes visible.
//!
//! Bincode is the on-disk format. JSON is for the boundary and debugging.

pub mod db;

pub use db::{DbError, DbResult, VaultDb};
