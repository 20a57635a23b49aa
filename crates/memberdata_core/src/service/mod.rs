//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository and query calls into use-case level APIs.
//! - Keep callers decoupled from store and predicate details.

pub mod member_service;
pub mod repository_service;
