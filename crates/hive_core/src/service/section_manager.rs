//! Hive section lifecycle service.
//!
//! # Responsibility
//! - Enforce code uniqueness and soft-delete gating above the repository.
//! - Stamp audit metadata from the injected `ActorContext`.
//! - Project persisted records into caller-facing views.
//!
//! # Invariants
//! - Checks always run before the write and commit of the same call.
//! - Every mutating call either commits fully or rolls back its unit of work.
//! - `set_status` with an unchanged flag performs no write.
//! - Listings are ordered by `id ASC`.

use crate::model::hive_section::{
    ActorId, HiveId, HiveSection, HiveSectionListItem, HiveSectionRecord, NewHiveSection,
    SectionId, UpdateHiveSectionRequest,
};
use crate::repo::section_repo::{RepoError, SectionFilter, SectionRepository};
use crate::service::actor::ActorContext;
use log::{debug, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};

const CODE_FIELD: &str = "code";

/// Errors from hive section operations.
#[derive(Debug)]
pub enum SectionServiceError {
    /// No section has the requested id.
    NotFound(SectionId),
    /// Request conflicts with current state; `field` names the clashing
    /// input when there is one.
    Conflict { field: Option<&'static str> },
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl SectionServiceError {
    fn code_conflict() -> Self {
        Self::Conflict {
            field: Some(CODE_FIELD),
        }
    }
}

impl Display for SectionServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "hive section not found: {id}"),
            Self::Conflict { field: Some(field) } => {
                write!(f, "hive section conflicts on field `{field}`")
            }
            Self::Conflict { field: None } => {
                write!(f, "hive section conflicts with its current state")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SectionServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for SectionServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound(id),
            RepoError::DuplicateCode(_) => Self::code_conflict(),
            other => Self::Repo(other),
        }
    }
}

pub type SectionServiceResult<T> = Result<T, SectionServiceError>;

/// Service facade over a section repository and the caller's identity.
pub struct HiveSectionManager<R: SectionRepository, A: ActorContext> {
    repo: R,
    actor: A,
}

impl<R: SectionRepository, A: ActorContext> HiveSectionManager<R, A> {
    pub fn new(repo: R, actor: A) -> Self {
        Self { repo, actor }
    }

    /// Lists every section, deleted ones included, ordered by id.
    pub fn list_sections(&self) -> SectionServiceResult<Vec<HiveSectionListItem>> {
        let records = self.repo.query(&SectionFilter::all())?;
        Ok(records.iter().map(to_list_item).collect())
    }

    /// Lists sections owned by `hive_id`, ordered by id.
    pub fn list_hive_sections(
        &self,
        hive_id: HiveId,
    ) -> SectionServiceResult<Vec<HiveSectionListItem>> {
        let records = self.repo.query(&SectionFilter::by_hive(hive_id))?;
        Ok(records.iter().map(to_list_item).collect())
    }

    pub fn get_section(&self, id: SectionId) -> SectionServiceResult<HiveSection> {
        self.find(id).map(|record| to_view(&record))
    }

    /// Sets the soft-delete flag.
    ///
    /// # Contract
    /// - Unchanged flag: returns without writing or bumping `last_updated`.
    /// - Changed flag: stamps audit columns and commits.
    pub fn set_status(&self, id: SectionId, is_deleted: bool) -> SectionServiceResult<()> {
        let mut record = self.find(id)?;
        if record.is_deleted == is_deleted {
            debug!("event=section_set_status module=service status=noop section_id={id}");
            return Ok(());
        }

        record.is_deleted = is_deleted;
        record.touch(self.actor.current_actor_id(), now_epoch_ms());
        self.in_unit_of_work(|repo| {
            repo.update(&record)?;
            repo.commit()?;
            Ok(())
        })?;

        info!(
            "event=section_set_status module=service status=ok section_id={id} is_deleted={is_deleted}"
        );
        Ok(())
    }

    /// Creates a section under `hive_id`.
    ///
    /// # Errors
    /// - `Conflict { field: Some("code") }` when any section, deleted or
    ///   not, already holds `request.code`.
    pub fn create_section(
        &self,
        request: &UpdateHiveSectionRequest,
        hive_id: HiveId,
    ) -> SectionServiceResult<HiveSection> {
        self.ensure_code_free(&SectionFilter::by_code(request.code.as_str()))?;

        let section = new_section(request, hive_id, self.actor.current_actor_id());
        let created = self.in_unit_of_work(|repo| {
            let id = repo.add(&section)?;
            repo.commit()?;
            Ok(id)
        })?;

        info!("event=section_create module=service status=ok section_id={created} hive_id={hive_id}");
        self.get_section(created)
    }

    /// Replaces `name` and `code` of an existing section.
    ///
    /// Returns the state read back from storage after commit.
    ///
    /// # Errors
    /// - `Conflict { field: Some("code") }` when another section holds
    ///   `request.code`; checked before existence.
    /// - `NotFound` when `id` does not exist.
    pub fn update_section(
        &self,
        id: SectionId,
        request: &UpdateHiveSectionRequest,
    ) -> SectionServiceResult<HiveSection> {
        self.ensure_code_free(&SectionFilter::by_code(request.code.as_str()).excluding(id))?;

        let mut record = self.find(id)?;
        apply_request(&mut record, request);
        record.touch(self.actor.current_actor_id(), now_epoch_ms());
        self.in_unit_of_work(|repo| {
            repo.update(&record)?;
            repo.commit()?;
            Ok(())
        })?;

        info!("event=section_update module=service status=ok section_id={id}");
        self.get_section(id)
    }

    /// Permanently removes a soft-deleted section.
    ///
    /// # Errors
    /// - `NotFound` when `id` does not exist.
    /// - `Conflict { field: None }` when the section is still active.
    pub fn delete_section(&self, id: SectionId) -> SectionServiceResult<()> {
        let record = self.find(id)?;
        if record.is_active() {
            debug!("event=section_delete module=service status=conflict section_id={id}");
            return Err(SectionServiceError::Conflict { field: None });
        }

        self.in_unit_of_work(|repo| {
            repo.remove(id)?;
            repo.commit()?;
            Ok(())
        })?;

        info!("event=section_delete module=service status=ok section_id={id}");
        Ok(())
    }

    fn find(&self, id: SectionId) -> SectionServiceResult<HiveSectionRecord> {
        self.repo
            .query(&SectionFilter::by_id(id))?
            .into_iter()
            .next()
            .ok_or(SectionServiceError::NotFound(id))
    }

    fn ensure_code_free(&self, filter: &SectionFilter) -> SectionServiceResult<()> {
        if self.repo.query(filter)?.is_empty() {
            return Ok(());
        }
        debug!("event=section_code_check module=service status=conflict");
        Err(SectionServiceError::code_conflict())
    }

    /// Runs `op` and discards its pending writes if it fails.
    fn in_unit_of_work<T>(
        &self,
        op: impl FnOnce(&R) -> SectionServiceResult<T>,
    ) -> SectionServiceResult<T> {
        let result = op(&self.repo);
        if result.is_err() {
            if let Err(err) = self.repo.rollback() {
                warn!("event=unit_of_work module=service status=error error_code=rollback_failed error={err}");
            }
        }
        result
    }
}

fn to_view(record: &HiveSectionRecord) -> HiveSection {
    HiveSection {
        id: record.id,
        hive_id: record.hive_id,
        name: record.name.clone(),
        code: record.code.clone(),
        is_deleted: record.is_deleted,
        created_by: record.created_by,
        last_updated_by: record.last_updated_by,
        last_updated: record.last_updated,
    }
}

fn to_list_item(record: &HiveSectionRecord) -> HiveSectionListItem {
    HiveSectionListItem {
        id: record.id,
        name: record.name.clone(),
        code: record.code.clone(),
        is_deleted: record.is_deleted,
    }
}

fn new_section(
    request: &UpdateHiveSectionRequest,
    hive_id: HiveId,
    actor: ActorId,
) -> NewHiveSection {
    NewHiveSection {
        hive_id,
        name: request.name.clone(),
        code: request.code.clone(),
        is_deleted: false,
        created_by: actor,
        last_updated_by: actor,
        last_updated: now_epoch_ms(),
    }
}

fn apply_request(record: &mut HiveSectionRecord, request: &UpdateHiveSectionRequest) {
    record.name = request.name.clone();
    record.code = request.code.clone();
}

fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
}
