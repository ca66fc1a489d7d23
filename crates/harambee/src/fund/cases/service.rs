use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use uuid::Uuid;

use crate::config::FundPolicy;
use crate::fund::auth::Principal;
use crate::fund::contributions::repository::ContributionRepository;
use crate::fund::contributions::ContributionRecord;
use crate::fund::error::FundError;
use crate::fund::ids::{self, CASE_ID_PREFIX, CASE_ID_WIDTH};
use crate::fund::members::{MemberRecord, MemberRepository};
use crate::fund::notify::{self, Notification, NotificationEvent, Notifier};
use crate::fund::repository::{Page, PageRequest, RepositoryError};

use super::domain::{
    CaseDocument, CaseFilter, CaseId, CasePatch, CaseRecord, CaseStatus, CaseSubmission,
    ContactRole,
};
use super::repository::{CaseRepository, DocumentStore, StorageError};

/// Minimum length for the narrative fields of a submission.
const MIN_NARRATIVE_LEN: usize = 10;

/// Service enforcing the case review state machine and its approval side
/// effects.
pub struct CaseService<C, M, T, S, N> {
    cases: Arc<C>,
    members: Arc<M>,
    contributions: Arc<T>,
    documents: Arc<S>,
    notifier: Arc<N>,
    policy: FundPolicy,
}

impl<C, M, T, S, N> CaseService<C, M, T, S, N>
where
    C: CaseRepository + 'static,
    M: MemberRepository + 'static,
    T: ContributionRepository + 'static,
    S: DocumentStore + 'static,
    N: Notifier + 'static,
{
    pub fn new(
        cases: Arc<C>,
        members: Arc<M>,
        contributions: Arc<T>,
        documents: Arc<S>,
        notifier: Arc<N>,
        policy: FundPolicy,
    ) -> Self {
        Self {
            cases,
            members,
            contributions,
            documents,
            notifier,
            policy,
        }
    }

    /// File a new case report on behalf of a member.
    pub fn submit(
        &self,
        actor: &Principal,
        submission: CaseSubmission,
        today: NaiveDate,
    ) -> Result<CaseRecord, FundError> {
        let member = self
            .members
            .fetch(&submission.member_id)?
            .ok_or_else(|| FundError::not_found("member", submission.member_id.0.clone()))?;

        validate_submission(&submission)?;

        // One retry with freshly computed identifiers absorbs a lost
        // generation race.
        let mut retried = false;
        let stored = loop {
            let case_id = self.next_case_id()?;
            let case_number = self.cases.latest_case_number()?.unwrap_or(0) + 1;

            let record = CaseRecord {
                case_id,
                case_number,
                member_id: member.member_id.clone(),
                filed_by: actor.id.clone(),
                case_type: submission.case_type,
                description: submission.description.trim().to_string(),
                reporting_reason: submission.reporting_reason.trim().to_string(),
                incident_date: submission.incident_date,
                urgency: submission.urgency,
                status: CaseStatus::Pending,
                submitted_date: today,
                reviewed_date: None,
                reviewer_notes: None,
                required_amount: submission.required_amount,
                collected_amount: 0,
                duration_days: self.policy.default_duration_days,
                start_date: None,
                due_date: None,
                approved_on: None,
                disbursed_on: None,
                confirmed_receipt: false,
                contacts: submission.contacts.clone(),
                documents: Vec::new(),
            };

            match self.cases.insert(record) {
                Ok(stored) => break stored,
                Err(RepositoryError::Conflict) if !retried => {
                    retried = true;
                    continue;
                }
                Err(err) => return Err(err.into()),
            }
        };

        self.notify_case_event(
            NotificationEvent::CaseSubmitted,
            &stored,
            Some(&member),
            None,
        );

        Ok(stored)
    }

    /// Review transition (admin only). The first transition into `approved`
    /// computes the contribution window and generates the obligation batch;
    /// re-approval is side-effect free.
    pub fn transition_status(
        &self,
        actor: &Principal,
        case_id: &CaseId,
        new_status: CaseStatus,
        notes: Option<String>,
        today: NaiveDate,
    ) -> Result<CaseRecord, FundError> {
        if !actor.is_admin() {
            return Err(FundError::forbidden(
                "only administrators may change case status",
            ));
        }

        let mut case = self.fetch_case(case_id)?;

        if new_status == CaseStatus::Completed {
            return Err(FundError::invalid_state(
                "cases complete through receipt confirmation, not a status write",
            ));
        }

        if !case.status.can_transition_to(new_status) {
            return Err(FundError::invalid_state(format!(
                "case {} cannot move from {} to {}",
                case.case_id.0,
                case.status.label(),
                new_status.label()
            )));
        }

        if case.status == CaseStatus::Pending && new_status != CaseStatus::Pending {
            case.reviewed_date.get_or_insert(today);
        }
        if let Some(notes) = notes {
            case.reviewer_notes = Some(notes);
        }

        let first_approval = new_status == CaseStatus::Approved && case.approved_on.is_none();
        if new_status == CaseStatus::Disbursed && case.disbursed_on.is_none() {
            case.disbursed_on = Some(today);
        }
        case.status = new_status;

        if first_approval {
            case.approved_on = Some(today);
            let start = today + Duration::days(1);
            let due = start + Duration::days(case.duration_days);
            case.start_date = Some(start);
            case.due_date = Some(due);
            self.approve_with_obligations(&case, due)?;
        } else {
            self.cases.update(case.clone())?;
        }

        let member = self.members.fetch(&case.member_id)?;
        self.notify_case_event(
            NotificationEvent::CaseStatusChanged,
            &case,
            member.as_ref(),
            case.reviewer_notes.as_deref(),
        );

        Ok(case)
    }

    /// Patch mutable case fields. Non-admin filers may adjust the narrative
    /// and urgency of their own pending cases; admins may patch any case,
    /// though the contribution window is frozen once approved.
    pub fn update(
        &self,
        actor: &Principal,
        case_id: &CaseId,
        patch: CasePatch,
    ) -> Result<CaseRecord, FundError> {
        let mut case = self.fetch_case(case_id)?;

        if !actor.is_admin() {
            if case.filed_by != actor.id {
                return Err(FundError::forbidden("not authorized to update this case"));
            }
            if case.status != CaseStatus::Pending {
                return Err(FundError::invalid_state(
                    "only pending cases can be updated by their filer",
                ));
            }
            if patch.duration_days.is_some() || patch.required_amount.is_some() {
                return Err(FundError::forbidden(
                    "only administrators may adjust amounts or the contribution window",
                ));
            }
        }

        if let Some(description) = patch.description {
            require_narrative("description", &description)?;
            case.description = description.trim().to_string();
        }
        if let Some(reason) = patch.reporting_reason {
            require_narrative("reporting reason", &reason)?;
            case.reporting_reason = reason.trim().to_string();
        }
        if let Some(urgency) = patch.urgency {
            case.urgency = urgency;
        }
        if let Some(duration) = patch.duration_days {
            if case.approved_on.is_some() {
                return Err(FundError::invalid_state(
                    "the contribution window is fixed once a case is approved",
                ));
            }
            if duration <= 0 {
                return Err(FundError::validation(
                    "duration must be a positive number of days",
                ));
            }
            case.duration_days = duration;
        }
        if let Some(amount) = patch.required_amount {
            if case.approved_on.is_some() {
                return Err(FundError::invalid_state(
                    "the required amount is fixed once a case is approved",
                ));
            }
            if amount == 0 {
                return Err(FundError::validation("required amount must be positive"));
            }
            case.required_amount = amount;
        }

        self.cases.update(case.clone())?;
        Ok(case)
    }

    /// Delete a case. Filers may remove their own pending reports; admins
    /// may remove any case. Embedded contacts and documents go with it, as
    /// do its contribution rows; probation rows are audit history and stay.
    pub fn delete(&self, actor: &Principal, case_id: &CaseId) -> Result<(), FundError> {
        let case = self.fetch_case(case_id)?;

        if !actor.is_admin() {
            if case.filed_by != actor.id {
                return Err(FundError::forbidden("not authorized to delete this case"));
            }
            if case.status != CaseStatus::Pending {
                return Err(FundError::invalid_state(
                    "only pending cases can be deleted by their filer",
                ));
            }
        }

        for document in &case.documents {
            if let Err(err) = self.documents.delete(&document.storage_key) {
                tracing::warn!(
                    case = %case.case_id.0,
                    key = %document.storage_key,
                    error = %err,
                    "failed to remove case document blob"
                );
            }
        }

        self.contributions.delete_by_case(case_id)?;
        self.cases.delete(case_id)?;
        Ok(())
    }

    /// Confirm that the disbursed support reached the affected member.
    /// Callable only by the affected member or the filer, and only while the
    /// case is `disbursed`.
    pub fn confirm_receipt(
        &self,
        actor: &Principal,
        case_id: &CaseId,
        _today: NaiveDate,
    ) -> Result<CaseRecord, FundError> {
        let mut case = self.fetch_case(case_id)?;

        let member = self.members.fetch(&case.member_id)?;
        let is_affected_member = member
            .as_ref()
            .map(|member| member.principal_id == actor.id)
            .unwrap_or(false);
        if case.filed_by != actor.id && !is_affected_member {
            return Err(FundError::forbidden(
                "only the affected member or the filer may confirm receipt",
            ));
        }

        if case.status != CaseStatus::Disbursed {
            return Err(FundError::invalid_state(format!(
                "case {} is {}, receipt can be confirmed only after disbursement",
                case.case_id.0,
                case.status.label()
            )));
        }

        case.confirmed_receipt = true;
        case.status = CaseStatus::Completed;
        self.cases.update(case.clone())?;

        self.notify_case_event(
            NotificationEvent::CaseStatusChanged,
            &case,
            member.as_ref(),
            None,
        );

        Ok(case)
    }

    pub fn get(&self, actor: &Principal, case_id: &CaseId) -> Result<CaseRecord, FundError> {
        let case = self.fetch_case(case_id)?;
        if actor.is_admin() || case.filed_by == actor.id {
            return Ok(case);
        }
        let member = self.members.fetch(&case.member_id)?;
        let is_affected_member = member
            .map(|member| member.principal_id == actor.id)
            .unwrap_or(false);
        if is_affected_member {
            Ok(case)
        } else {
            Err(FundError::forbidden("not authorized to view this case"))
        }
    }

    /// Listing is a pure read; non-admin callers see only their own filings.
    pub fn list(
        &self,
        actor: &Principal,
        mut filter: CaseFilter,
        page: PageRequest,
    ) -> Result<Page<CaseRecord>, FundError> {
        if !actor.is_admin() {
            filter.filed_by = Some(actor.id.clone());
        }
        Ok(self.cases.list(&filter, page)?)
    }

    /// Store a supporting document and attach its metadata to the case.
    pub fn attach_document(
        &self,
        actor: &Principal,
        case_id: &CaseId,
        name: &str,
        bytes: &[u8],
        today: NaiveDate,
    ) -> Result<CaseRecord, FundError> {
        let mut case = self.fetch_case(case_id)?;
        if !actor.is_admin() && case.filed_by != actor.id {
            return Err(FundError::forbidden(
                "not authorized to attach documents to this case",
            ));
        }
        if name.trim().is_empty() {
            return Err(FundError::validation("document name must not be empty"));
        }
        if bytes.is_empty() {
            return Err(FundError::validation("document content must not be empty"));
        }

        let stored = self
            .documents
            .put(bytes, name)
            .map_err(|err| FundError::Storage(err.to_string()))?;

        case.documents.push(CaseDocument {
            id: Uuid::new_v4(),
            name: name.to_string(),
            storage_key: stored.key,
            url: stored.url,
            uploaded_on: today,
        });
        self.cases.update(case.clone())?;
        Ok(case)
    }

    /// Detach a document and delete its blob.
    pub fn remove_document(
        &self,
        actor: &Principal,
        case_id: &CaseId,
        document_id: Uuid,
    ) -> Result<CaseRecord, FundError> {
        let mut case = self.fetch_case(case_id)?;
        if !actor.is_admin() && case.filed_by != actor.id {
            return Err(FundError::forbidden(
                "not authorized to remove documents from this case",
            ));
        }

        let index = case
            .documents
            .iter()
            .position(|document| document.id == document_id)
            .ok_or_else(|| FundError::not_found("document", document_id.to_string()))?;
        let document = case.documents.remove(index);

        match self.documents.delete(&document.storage_key) {
            Ok(()) | Err(StorageError::Missing(_)) => {}
            Err(err) => return Err(FundError::Storage(err.to_string())),
        }

        self.cases.update(case.clone())?;
        Ok(case)
    }

    /// Commit the approval together with its obligation batch. The batch
    /// goes in first (all-or-nothing); if the case write then fails, the
    /// batch is compensated so no path leaves an approved case with a
    /// partial contribution set.
    fn approve_with_obligations(
        &self,
        case: &CaseRecord,
        due_date: NaiveDate,
    ) -> Result<(), FundError> {
        let pool = self.members.active()?;
        let rows: Vec<ContributionRecord> = pool
            .iter()
            .filter(|member| member.principal_id != case.filed_by)
            .map(|member| {
                ContributionRecord::obligation(
                    case.case_id.clone(),
                    member.member_id.clone(),
                    self.policy.contribution_amount,
                    due_date,
                )
            })
            .collect();

        self.contributions.insert_batch(rows)?;

        if let Err(err) = self.cases.update(case.clone()) {
            self.contributions.delete_by_case(&case.case_id)?;
            return Err(err.into());
        }

        Ok(())
    }

    fn fetch_case(&self, case_id: &CaseId) -> Result<CaseRecord, FundError> {
        self.cases
            .fetch(case_id)?
            .ok_or_else(|| FundError::not_found("case", case_id.0.clone()))
    }

    fn next_case_id(&self) -> Result<CaseId, FundError> {
        let existing = self.cases.case_ids()?;
        let mut id = ids::next_id(
            CASE_ID_PREFIX,
            CASE_ID_WIDTH,
            existing.iter().map(String::as_str),
        )?;

        while self.cases.fetch(&CaseId(id.clone()))?.is_some() {
            let value = ids::sequence_value(CASE_ID_PREFIX, &id)?;
            id = ids::format_id(CASE_ID_PREFIX, CASE_ID_WIDTH, value + 1);
        }

        Ok(CaseId(id))
    }

    /// Best-effort fan-out to the filer (when their account has a member
    /// profile) and the fund administrator.
    fn notify_case_event(
        &self,
        event: NotificationEvent,
        case: &CaseRecord,
        affected_member: Option<&MemberRecord>,
        notes: Option<&str>,
    ) {
        let mut recipients: Vec<String> = Vec::new();
        match self.members.fetch_by_principal(&case.filed_by) {
            Ok(Some(filer)) => recipients.push(filer.email),
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(case = %case.case_id.0, error = %err, "filer lookup failed");
            }
        }
        recipients.push(self.policy.admin_email.clone());
        recipients.dedup();

        for recipient in recipients {
            let mut notification = Notification::new(event, recipient)
                .with("case_id", &case.case_id.0)
                .with("case_type", case.case_type.label())
                .with("status", case.status.label())
                .with("urgency", case.urgency.label());
            if let Some(member) = affected_member {
                notification = notification.with("member_name", &member.full_name);
            }
            if let Some(notes) = notes {
                notification = notification.with("notes", notes);
            }
            notify::dispatch(self.notifier.as_ref(), notification);
        }
    }
}

fn require_narrative(field: &str, value: &str) -> Result<(), FundError> {
    if value.trim().chars().count() < MIN_NARRATIVE_LEN {
        return Err(FundError::validation(format!(
            "{field} must be at least {MIN_NARRATIVE_LEN} characters"
        )));
    }
    Ok(())
}

fn validate_submission(submission: &CaseSubmission) -> Result<(), FundError> {
    require_narrative("description", &submission.description)?;
    require_narrative("reporting reason", &submission.reporting_reason)?;

    if submission.required_amount == 0 {
        return Err(FundError::validation("required amount must be positive"));
    }

    for role in ContactRole::ordered() {
        let count = submission
            .contacts
            .iter()
            .filter(|contact| contact.role == role)
            .count();
        if count == 0 {
            return Err(FundError::validation(format!(
                "a {} verification contact is required",
                role.label()
            )));
        }
        if count > 1 {
            return Err(FundError::validation(format!(
                "only one {} verification contact is allowed",
                role.label()
            )));
        }
    }

    for contact in &submission.contacts {
        if contact.name.trim().is_empty() || contact.phone.trim().is_empty() {
            return Err(FundError::validation(
                "verification contacts require a name and phone number",
            ));
        }
    }

    Ok(())
}
