//! Contribution obligations and the probation ledger.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    ContributionId, ContributionRecord, ContributionStatus, PaymentRequest, ProbationId,
    ProbationRecord, VerifyOutcome,
};
pub use repository::{ContributionRepository, ProbationRepository};
pub use router::contribution_router;
pub use service::ContributionService;
