use crate::fund::auth::PrincipalId;
use crate::fund::repository::{Page, PageRequest, RepositoryError};

use super::domain::{MemberFilter, MemberId, MemberRecord};

/// Storage abstraction for member records.
///
/// `insert` must reject duplicate member identifiers and duplicate principal
/// links with `Conflict`; identifier races are arbitrated here.
pub trait MemberRepository: Send + Sync {
    fn insert(&self, record: MemberRecord) -> Result<MemberRecord, RepositoryError>;
    fn update(&self, record: MemberRecord) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &MemberId) -> Result<Option<MemberRecord>, RepositoryError>;
    fn fetch_by_principal(
        &self,
        principal: &PrincipalId,
    ) -> Result<Option<MemberRecord>, RepositoryError>;
    /// Every member identifier currently in storage; input to sequence
    /// computation.
    fn member_ids(&self) -> Result<Vec<String>, RepositoryError>;
    /// Members eligible for obligation generation.
    fn active(&self) -> Result<Vec<MemberRecord>, RepositoryError>;
    fn list(
        &self,
        filter: &MemberFilter,
        page: PageRequest,
    ) -> Result<Page<MemberRecord>, RepositoryError>;
}
