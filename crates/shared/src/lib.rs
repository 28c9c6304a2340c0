//! Shared utilities for the group programs backend.
//!
//! - Access token verification (JWT) for identifying the calling user
//! - Field validators reused by request payloads

pub mod jwt;
pub mod validation;
