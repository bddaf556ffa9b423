//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the section data access contract used by the manager.
//! - Isolate SQLite query details from lifecycle orchestration.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`NotFound`, `DuplicateCode`)
//!   in addition to DB transport errors.

pub mod section_repo;
