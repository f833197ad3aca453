//! Bookkeeping core of the school portal: feature-flag settings, the school
//! profile singleton, and the audit trail of mutating operations.
//!
//! Reads here degrade instead of failing: a broken store yields the caller's
//! default (or an empty page) wrapped in an [`Outcome`] that carries a warning.
//! Writes that a caller must be able to observe as failed return
//! `Result<_, CoreError>`.

pub mod audit;
pub mod error;
pub mod outcome;
pub mod profile;
pub mod settings;

pub use audit::{
    Actor, AuditEntryDetail, AuditFilter, AuditLog, AuditPage, AuditQueryParams, AuditRecord,
    FilterOptions, RecordOutcome, RequestMeta,
};
pub use error::CoreError;
pub use outcome::Outcome;
pub use profile::{ProfileUpdate, PublicProfile, SchoolProfiles};
pub use schoolhub_db::entities::audit_entry::Operation;
pub use settings::SettingsStore;
