//! Persistence layer for the group programs backend.
//!
//! This crate contains:
//! - Database connection management and migrations
//! - Entity definitions (database row mappings)
//! - PostgreSQL implementations of the domain storage and collaborator traits

pub mod db;
pub mod entities;
pub mod error;
pub mod metrics;
pub mod repositories;
