//! Hive section domain model.
//!
//! # Responsibility
//! - Define the persisted section record and its caller-facing projections.
//! - Define the create/update request shape and its opt-in pre-check.
//!
//! # Invariants
//! - Every section is identified by a storage-assigned `SectionId`.
//! - Permanent removal is only legal for soft-deleted records.

pub mod hive_section;
