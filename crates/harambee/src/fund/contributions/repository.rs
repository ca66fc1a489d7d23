use chrono::NaiveDate;

use crate::fund::cases::CaseId;
use crate::fund::members::MemberId;
use crate::fund::repository::RepositoryError;

use super::domain::{ContributionId, ContributionRecord, ProbationId, ProbationRecord};

/// Storage abstraction for contribution obligations.
pub trait ContributionRepository: Send + Sync {
    /// Insert an approval batch as a unit: either every row is stored or
    /// none is. A row whose (case, member) pair already exists makes the
    /// whole batch a `Conflict`.
    fn insert_batch(
        &self,
        records: Vec<ContributionRecord>,
    ) -> Result<Vec<ContributionRecord>, RepositoryError>;
    fn update(&self, record: ContributionRecord) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &ContributionId) -> Result<Option<ContributionRecord>, RepositoryError>;
    fn find_by_case_member(
        &self,
        case_id: &CaseId,
        member_id: &MemberId,
    ) -> Result<Option<ContributionRecord>, RepositoryError>;
    fn list_by_case(&self, case_id: &CaseId) -> Result<Vec<ContributionRecord>, RepositoryError>;
    fn list_by_member(
        &self,
        member_id: &MemberId,
    ) -> Result<Vec<ContributionRecord>, RepositoryError>;
    /// Pending rows whose deadline falls strictly before `date`.
    fn pending_due_before(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<ContributionRecord>, RepositoryError>;
    /// Cascade used when a case is deleted or an approval is compensated.
    fn delete_by_case(&self, case_id: &CaseId) -> Result<(), RepositoryError>;
}

/// Storage abstraction for probation sanctions. Rows are never deleted;
/// resolution closes them in place.
pub trait ProbationRepository: Send + Sync {
    fn insert(&self, record: ProbationRecord) -> Result<ProbationRecord, RepositoryError>;
    fn update(&self, record: ProbationRecord) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &ProbationId) -> Result<Option<ProbationRecord>, RepositoryError>;
    fn active_for_member(
        &self,
        member_id: &MemberId,
    ) -> Result<Vec<ProbationRecord>, RepositoryError>;
    fn list_by_member(&self, member_id: &MemberId)
        -> Result<Vec<ProbationRecord>, RepositoryError>;
}
