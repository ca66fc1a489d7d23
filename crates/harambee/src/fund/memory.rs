//! In-memory implementations of the fund's collaborator traits.
//!
//! A single mutex guards all four entity maps, so each repository call is
//! atomic with respect to every other, matching the single-writer model the
//! services assume. Deployments with a relational store supply their own
//! implementations; these back the shipped binary and the test suites.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::fund::auth::PrincipalId;
use crate::fund::cases::{
    CaseFilter, CaseId, CaseRecord, CaseRepository, DocumentStore, StorageError, StoredObject,
};
use crate::fund::contributions::{
    ContributionId, ContributionRecord, ContributionRepository, ProbationId, ProbationRecord,
    ProbationRepository,
};
use crate::fund::members::{MemberFilter, MemberId, MemberRecord, MemberRepository};
use crate::fund::notify::{Notification, Notifier, NotifyError};
use crate::fund::repository::{Page, PageRequest, RepositoryError};

#[derive(Default)]
struct FundState {
    members: HashMap<MemberId, MemberRecord>,
    cases: HashMap<CaseId, CaseRecord>,
    contributions: HashMap<ContributionId, ContributionRecord>,
    probations: HashMap<ProbationId, ProbationRecord>,
}

/// Shared in-memory store implementing every repository trait.
#[derive(Default)]
pub struct InMemoryFundStore {
    state: Mutex<FundState>,
}

impl InMemoryFundStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MemberRepository for InMemoryFundStore {
    fn insert(&self, record: MemberRecord) -> Result<MemberRecord, RepositoryError> {
        let mut state = self.state.lock().expect("fund store mutex poisoned");
        if state.members.contains_key(&record.member_id) {
            return Err(RepositoryError::Conflict);
        }
        if state
            .members
            .values()
            .any(|member| member.principal_id == record.principal_id)
        {
            return Err(RepositoryError::Conflict);
        }
        state
            .members
            .insert(record.member_id.clone(), record.clone());
        Ok(record)
    }

    fn update(&self, record: MemberRecord) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().expect("fund store mutex poisoned");
        if !state.members.contains_key(&record.member_id) {
            return Err(RepositoryError::NotFound);
        }
        state.members.insert(record.member_id.clone(), record);
        Ok(())
    }

    fn fetch(&self, id: &MemberId) -> Result<Option<MemberRecord>, RepositoryError> {
        let state = self.state.lock().expect("fund store mutex poisoned");
        Ok(state.members.get(id).cloned())
    }

    fn fetch_by_principal(
        &self,
        principal: &PrincipalId,
    ) -> Result<Option<MemberRecord>, RepositoryError> {
        let state = self.state.lock().expect("fund store mutex poisoned");
        Ok(state
            .members
            .values()
            .find(|member| &member.principal_id == principal)
            .cloned())
    }

    fn member_ids(&self) -> Result<Vec<String>, RepositoryError> {
        let state = self.state.lock().expect("fund store mutex poisoned");
        Ok(state.members.keys().map(|id| id.0.clone()).collect())
    }

    fn active(&self) -> Result<Vec<MemberRecord>, RepositoryError> {
        let state = self.state.lock().expect("fund store mutex poisoned");
        let mut members: Vec<MemberRecord> = state
            .members
            .values()
            .filter(|member| member.status == crate::fund::members::MemberStatus::Active)
            .cloned()
            .collect();
        members.sort_by(|a, b| a.member_id.0.cmp(&b.member_id.0));
        Ok(members)
    }

    fn list(
        &self,
        filter: &MemberFilter,
        page: PageRequest,
    ) -> Result<Page<MemberRecord>, RepositoryError> {
        let state = self.state.lock().expect("fund store mutex poisoned");
        let mut filtered: Vec<MemberRecord> = state
            .members
            .values()
            .filter(|member| filter.matches(member))
            .cloned()
            .collect();
        filtered.sort_by(|a, b| a.member_id.0.cmp(&b.member_id.0));
        Ok(Page::from_filtered(filtered, page))
    }
}

impl CaseRepository for InMemoryFundStore {
    fn insert(&self, record: CaseRecord) -> Result<CaseRecord, RepositoryError> {
        let mut state = self.state.lock().expect("fund store mutex poisoned");
        if state.cases.contains_key(&record.case_id) {
            return Err(RepositoryError::Conflict);
        }
        if state
            .cases
            .values()
            .any(|case| case.case_number == record.case_number)
        {
            return Err(RepositoryError::Conflict);
        }
        state.cases.insert(record.case_id.clone(), record.clone());
        Ok(record)
    }

    fn update(&self, record: CaseRecord) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().expect("fund store mutex poisoned");
        if !state.cases.contains_key(&record.case_id) {
            return Err(RepositoryError::NotFound);
        }
        state.cases.insert(record.case_id.clone(), record);
        Ok(())
    }

    fn fetch(&self, id: &CaseId) -> Result<Option<CaseRecord>, RepositoryError> {
        let state = self.state.lock().expect("fund store mutex poisoned");
        Ok(state.cases.get(id).cloned())
    }

    fn delete(&self, id: &CaseId) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().expect("fund store mutex poisoned");
        state
            .cases
            .remove(id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }

    fn case_ids(&self) -> Result<Vec<String>, RepositoryError> {
        let state = self.state.lock().expect("fund store mutex poisoned");
        Ok(state.cases.keys().map(|id| id.0.clone()).collect())
    }

    fn latest_case_number(&self) -> Result<Option<u32>, RepositoryError> {
        let state = self.state.lock().expect("fund store mutex poisoned");
        Ok(state.cases.values().map(|case| case.case_number).max())
    }

    fn list(
        &self,
        filter: &CaseFilter,
        page: PageRequest,
    ) -> Result<Page<CaseRecord>, RepositoryError> {
        let state = self.state.lock().expect("fund store mutex poisoned");
        let mut filtered: Vec<CaseRecord> = state
            .cases
            .values()
            .filter(|case| filter.matches(case))
            .cloned()
            .collect();
        // Newest first, mirroring a created_at-descending listing.
        filtered.sort_by(|a, b| b.case_number.cmp(&a.case_number));
        Ok(Page::from_filtered(filtered, page))
    }
}

impl ContributionRepository for InMemoryFundStore {
    fn insert_batch(
        &self,
        records: Vec<ContributionRecord>,
    ) -> Result<Vec<ContributionRecord>, RepositoryError> {
        let mut state = self.state.lock().expect("fund store mutex poisoned");

        for (index, record) in records.iter().enumerate() {
            let duplicate_in_store = state.contributions.values().any(|existing| {
                existing.case_id == record.case_id && existing.member_id == record.member_id
            });
            let duplicate_in_batch = records[..index].iter().any(|earlier| {
                earlier.case_id == record.case_id && earlier.member_id == record.member_id
            });
            if duplicate_in_store || duplicate_in_batch {
                return Err(RepositoryError::Conflict);
            }
        }

        for record in &records {
            state.contributions.insert(record.id, record.clone());
        }
        Ok(records)
    }

    fn update(&self, record: ContributionRecord) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().expect("fund store mutex poisoned");
        if !state.contributions.contains_key(&record.id) {
            return Err(RepositoryError::NotFound);
        }
        state.contributions.insert(record.id, record);
        Ok(())
    }

    fn fetch(&self, id: &ContributionId) -> Result<Option<ContributionRecord>, RepositoryError> {
        let state = self.state.lock().expect("fund store mutex poisoned");
        Ok(state.contributions.get(id).cloned())
    }

    fn find_by_case_member(
        &self,
        case_id: &CaseId,
        member_id: &MemberId,
    ) -> Result<Option<ContributionRecord>, RepositoryError> {
        let state = self.state.lock().expect("fund store mutex poisoned");
        Ok(state
            .contributions
            .values()
            .find(|record| &record.case_id == case_id && &record.member_id == member_id)
            .cloned())
    }

    fn list_by_case(&self, case_id: &CaseId) -> Result<Vec<ContributionRecord>, RepositoryError> {
        let state = self.state.lock().expect("fund store mutex poisoned");
        let mut records: Vec<ContributionRecord> = state
            .contributions
            .values()
            .filter(|record| &record.case_id == case_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| a.member_id.0.cmp(&b.member_id.0));
        Ok(records)
    }

    fn list_by_member(
        &self,
        member_id: &MemberId,
    ) -> Result<Vec<ContributionRecord>, RepositoryError> {
        let state = self.state.lock().expect("fund store mutex poisoned");
        let mut records: Vec<ContributionRecord> = state
            .contributions
            .values()
            .filter(|record| &record.member_id == member_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| (a.deadline, &a.case_id.0).cmp(&(b.deadline, &b.case_id.0)));
        Ok(records)
    }

    fn pending_due_before(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<ContributionRecord>, RepositoryError> {
        let state = self.state.lock().expect("fund store mutex poisoned");
        let mut records: Vec<ContributionRecord> = state
            .contributions
            .values()
            .filter(|record| {
                record.status == crate::fund::contributions::ContributionStatus::Pending
                    && record.deadline < date
            })
            .cloned()
            .collect();
        records.sort_by(|a, b| (a.deadline, &a.member_id.0).cmp(&(b.deadline, &b.member_id.0)));
        Ok(records)
    }

    fn delete_by_case(&self, case_id: &CaseId) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().expect("fund store mutex poisoned");
        state
            .contributions
            .retain(|_, record| &record.case_id != case_id);
        Ok(())
    }
}

impl ProbationRepository for InMemoryFundStore {
    fn insert(&self, record: ProbationRecord) -> Result<ProbationRecord, RepositoryError> {
        let mut state = self.state.lock().expect("fund store mutex poisoned");
        if state.probations.contains_key(&record.id) {
            return Err(RepositoryError::Conflict);
        }
        state.probations.insert(record.id, record.clone());
        Ok(record)
    }

    fn update(&self, record: ProbationRecord) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().expect("fund store mutex poisoned");
        if !state.probations.contains_key(&record.id) {
            return Err(RepositoryError::NotFound);
        }
        state.probations.insert(record.id, record);
        Ok(())
    }

    fn fetch(&self, id: &ProbationId) -> Result<Option<ProbationRecord>, RepositoryError> {
        let state = self.state.lock().expect("fund store mutex poisoned");
        Ok(state.probations.get(id).cloned())
    }

    fn active_for_member(
        &self,
        member_id: &MemberId,
    ) -> Result<Vec<ProbationRecord>, RepositoryError> {
        let state = self.state.lock().expect("fund store mutex poisoned");
        let mut records: Vec<ProbationRecord> = state
            .probations
            .values()
            .filter(|record| &record.member_id == member_id && record.is_active)
            .cloned()
            .collect();
        records.sort_by(|a, b| a.start_date.cmp(&b.start_date));
        Ok(records)
    }

    fn list_by_member(
        &self,
        member_id: &MemberId,
    ) -> Result<Vec<ProbationRecord>, RepositoryError> {
        let state = self.state.lock().expect("fund store mutex poisoned");
        let mut records: Vec<ProbationRecord> = state
            .probations
            .values()
            .filter(|record| &record.member_id == member_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| a.start_date.cmp(&b.start_date));
        Ok(records)
    }
}

/// Notifier that records every dispatched notification for inspection.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().expect("notifier mutex poisoned").clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .expect("notifier mutex poisoned")
            .push(notification);
        Ok(())
    }
}

/// Blob store keeping document bytes in a map; keys mimic object-store
/// paths.
#[derive(Default)]
pub struct InMemoryDocumentStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
}

impl InMemoryDocumentStore {
    pub fn contains(&self, key: &str) -> bool {
        self.objects
            .lock()
            .expect("document store mutex poisoned")
            .contains_key(key)
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn put(&self, bytes: &[u8], name: &str) -> Result<StoredObject, StorageError> {
        let key = format!("docs/{}/{name}", Uuid::new_v4());
        let url = format!("memory://{key}");
        self.objects
            .lock()
            .expect("document store mutex poisoned")
            .insert(key.clone(), bytes.to_vec());
        Ok(StoredObject { key, url })
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.objects
            .lock()
            .expect("document store mutex poisoned")
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| StorageError::Missing(key.to_string()))
    }
}
