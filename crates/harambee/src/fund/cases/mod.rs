//! Case lifecycle: submission, review state machine, approval side effects,
//! and receipt confirmation.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    CaseDocument, CaseFilter, CaseId, CasePatch, CaseRecord, CaseStatus, CaseSubmission, CaseType,
    CaseView, ContactRole, UrgencyLevel, VerificationContact,
};
pub use repository::{CaseRepository, DocumentStore, StorageError, StoredObject};
pub use router::case_router;
pub use service::CaseService;
