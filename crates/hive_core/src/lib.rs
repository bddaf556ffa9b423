//! Core lifecycle logic for hive sections.
//! This crate is the single source of truth for section invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::hive_section::{
    ActorId, HiveId, HiveSection, HiveSectionListItem, HiveSectionRecord, NewHiveSection,
    SectionId, SectionValidationError, UpdateHiveSectionRequest,
};
pub use repo::section_repo::{
    RepoError, RepoResult, SectionFilter, SectionRepository, SqliteSectionRepository,
};
pub use service::actor::{ActorContext, FixedActor};
pub use service::section_manager::{
    HiveSectionManager, SectionServiceError, SectionServiceResult,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
