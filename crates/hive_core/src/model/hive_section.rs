//! Hive section records, requests and views.
//!
//! # Invariants
//! - `id` and `hive_id` never change after creation.
//! - `code` is unique across all sections, soft-deleted ones included.
//! - `created_by` is set once; `last_updated*` move on every accepted write.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Storage-assigned section identifier.
pub type SectionId = i64;
/// Identifier of the owning hive.
pub type HiveId = i64;
/// Identifier of the actor stamped into audit columns.
pub type ActorId = i64;

const MAX_NAME_CHARS: usize = 60;
const MAX_CODE_CHARS: usize = 5;

/// Persisted hive section as stored in `hive_sections`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HiveSectionRecord {
    pub id: SectionId,
    pub hive_id: HiveId,
    pub name: String,
    pub code: String,
    /// Soft delete tombstone; required before hard delete.
    pub is_deleted: bool,
    pub created_by: ActorId,
    pub last_updated_by: ActorId,
    /// Unix epoch milliseconds.
    pub last_updated: i64,
}

impl HiveSectionRecord {
    /// Returns whether the section is visible/active.
    pub fn is_active(&self) -> bool {
        !self.is_deleted
    }

    /// Stamps audit columns for an accepted mutation.
    pub fn touch(&mut self, actor: ActorId, now_epoch_ms: i64) {
        self.last_updated_by = actor;
        self.last_updated = now_epoch_ms;
    }
}

/// Section fields known before storage assigns an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewHiveSection {
    pub hive_id: HiveId,
    pub name: String,
    pub code: String,
    pub is_deleted: bool,
    pub created_by: ActorId,
    pub last_updated_by: ActorId,
    pub last_updated: i64,
}

/// Caller-supplied fields for section create and update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateHiveSectionRequest {
    pub name: String,
    pub code: String,
}

impl UpdateHiveSectionRequest {
    pub fn new(name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            code: code.into(),
        }
    }

    /// Checks request shape before it is handed to the manager.
    ///
    /// The manager itself only enforces uniqueness and existence, so
    /// transports call this first.
    ///
    /// # Errors
    /// - Blank or over-long `name`.
    /// - Blank or over-long `code`, or `code` outside `[A-Z0-9]`.
    pub fn validate(&self) -> Result<(), SectionValidationError> {
        if self.name.trim().is_empty() {
            return Err(SectionValidationError::EmptyName);
        }
        if self.name.chars().count() > MAX_NAME_CHARS {
            return Err(SectionValidationError::NameTooLong {
                max_chars: MAX_NAME_CHARS,
            });
        }
        if self.code.trim().is_empty() {
            return Err(SectionValidationError::EmptyCode);
        }
        if self.code.chars().count() > MAX_CODE_CHARS {
            return Err(SectionValidationError::CodeTooLong {
                max_chars: MAX_CODE_CHARS,
            });
        }
        if !self
            .code
            .chars()
            .all(|ch| ch.is_ascii_uppercase() || ch.is_ascii_digit())
        {
            return Err(SectionValidationError::InvalidCodeFormat(self.code.clone()));
        }
        Ok(())
    }
}

/// Shape violations reported by `UpdateHiveSectionRequest::validate`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionValidationError {
    EmptyName,
    NameTooLong { max_chars: usize },
    EmptyCode,
    CodeTooLong { max_chars: usize },
    InvalidCodeFormat(String),
}

impl Display for SectionValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "section name must not be blank"),
            Self::NameTooLong { max_chars } => {
                write!(f, "section name must be at most {max_chars} characters")
            }
            Self::EmptyCode => write!(f, "section code must not be blank"),
            Self::CodeTooLong { max_chars } => {
                write!(f, "section code must be at most {max_chars} characters")
            }
            Self::InvalidCodeFormat(code) => write!(
                f,
                "section code `{code}` must contain only uppercase letters and digits"
            ),
        }
    }
}

impl Error for SectionValidationError {}

/// Detail view of one section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HiveSection {
    pub id: SectionId,
    pub hive_id: HiveId,
    pub name: String,
    pub code: String,
    pub is_deleted: bool,
    pub created_by: ActorId,
    pub last_updated_by: ActorId,
    /// Unix epoch milliseconds.
    pub last_updated: i64,
}

/// Summary view used by listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HiveSectionListItem {
    pub id: SectionId,
    pub name: String,
    pub code: String,
    pub is_deleted: bool,
}
