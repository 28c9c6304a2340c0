//! Domain layer for the group programs backend.
//!
//! This crate contains:
//! - Domain models (Program, Membership, SessionLog, chat messages, catalog entries)
//! - The membership state machine and progress aggregation
//! - Announcement correlation and poll reconciliation
//! - Collaborator traits with in-memory implementations
//! - Domain error types

pub mod error;
pub mod models;
pub mod services;

pub use error::{DomainError, DomainResult};
