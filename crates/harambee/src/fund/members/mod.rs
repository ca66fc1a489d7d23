//! Member registry: provisioning, the write-once profile lifecycle, and
//! administrative status management.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    CoveredPerson, FamilyMember, FamilyType, MemberFilter, MemberId, MemberProfile, MemberRecord,
    MemberStatus, MemberView, NextOfKin, ProfileSubmission, ProvisionMemberRequest,
};
pub use repository::MemberRepository;
pub use router::member_router;
pub use service::MemberService;
