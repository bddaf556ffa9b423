//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into section lifecycle operations.
//! - Keep transport layers decoupled from storage details.

pub mod actor;
pub mod section_manager;
