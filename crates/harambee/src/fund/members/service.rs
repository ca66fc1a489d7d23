use std::sync::Arc;

use chrono::NaiveDate;

use crate::config::FundPolicy;
use crate::fund::auth::Principal;
use crate::fund::error::FundError;
use crate::fund::ids::{self, MEMBER_ID_PREFIX, MEMBER_ID_WIDTH};
use crate::fund::notify::{self, Notification, NotificationEvent, Notifier};
use crate::fund::repository::{Page, PageRequest, RepositoryError};

use super::domain::{
    MemberFilter, MemberId, MemberProfile, MemberRecord, MemberStatus, ProfileSubmission,
    ProvisionMemberRequest,
};
use super::repository::MemberRepository;

/// Number of next-of-kin contacts a completed profile must carry.
const REQUIRED_NEXT_OF_KIN: usize = 2;

/// Service owning member provisioning, the one-shot profile completion
/// lifecycle, and administrative status changes.
pub struct MemberService<R, N> {
    repository: Arc<R>,
    notifier: Arc<N>,
    policy: FundPolicy,
}

impl<R, N> MemberService<R, N>
where
    R: MemberRepository + 'static,
    N: Notifier + 'static,
{
    pub fn new(repository: Arc<R>, notifier: Arc<N>, policy: FundPolicy) -> Self {
        Self {
            repository,
            notifier,
            policy,
        }
    }

    /// Provision a new member account (admin only). The member starts in
    /// `pending` with an incomplete profile and activates by completing it.
    pub fn provision(
        &self,
        actor: &Principal,
        request: ProvisionMemberRequest,
        today: NaiveDate,
    ) -> Result<MemberRecord, FundError> {
        require_admin(actor)?;

        if request.full_name.trim().is_empty() {
            return Err(FundError::validation("full name must not be empty"));
        }
        if request.email.trim().is_empty() {
            return Err(FundError::validation("email must not be empty"));
        }
        if request.phone.trim().is_empty() {
            return Err(FundError::validation("phone must not be empty"));
        }

        if self
            .repository
            .fetch_by_principal(&request.principal_id)?
            .is_some()
        {
            return Err(FundError::conflict(format!(
                "principal {} already has a member profile",
                request.principal_id.0
            )));
        }

        // One retry with a recomputed identifier absorbs a lost
        // generation race; a second conflict is surfaced.
        let mut retried = false;
        let stored = loop {
            let member_id = self.next_member_id()?;
            let record = MemberRecord {
                member_id,
                principal_id: request.principal_id.clone(),
                full_name: request.full_name.trim().to_string(),
                phone: request.phone.trim().to_string(),
                email: request.email.trim().to_string(),
                status: MemberStatus::Pending,
                join_date: today,
                profile_completed: false,
                profile: None,
                on_probation: false,
            };

            match self.repository.insert(record) {
                Ok(stored) => break stored,
                Err(RepositoryError::Conflict) if !retried => {
                    retried = true;
                    continue;
                }
                Err(err) => return Err(err.into()),
            }
        };

        notify::dispatch(
            self.notifier.as_ref(),
            Notification::new(NotificationEvent::WelcomeCreated, &stored.email)
                .with("member_id", &stored.member_id.0)
                .with("full_name", &stored.full_name)
                .with("support_contact", &self.policy.admin_email),
        );

        Ok(stored)
    }

    /// Complete the member's profile: validates the submission, stores the
    /// immutable snapshot, and activates the account. Callable exactly once.
    pub fn complete_profile(
        &self,
        actor: &Principal,
        member_id: &MemberId,
        submission: ProfileSubmission,
        today: NaiveDate,
    ) -> Result<MemberRecord, FundError> {
        let mut member = self.fetch_member(member_id)?;

        if !actor.is_admin() && member.principal_id != actor.id {
            return Err(FundError::forbidden(
                "only the member or an administrator may complete this profile",
            ));
        }

        if member.profile_completed {
            return Err(FundError::conflict(format!(
                "profile for member {} is already completed and immutable",
                member_id.0
            )));
        }

        validate_profile(&submission)?;

        let mut next_of_kin = submission.next_of_kin;
        for (index, kin) in next_of_kin.iter_mut().enumerate() {
            kin.priority = index as u8 + 1;
        }

        member.profile = Some(MemberProfile {
            date_of_birth: submission.date_of_birth,
            id_number: submission.id_number.trim().to_string(),
            occupation: submission.occupation,
            residence: submission.residence,
            family: submission.family,
            next_of_kin,
            covered_persons: submission.covered_persons,
            completed_on: today,
        });
        member.profile_completed = true;
        member.status = MemberStatus::Active;

        self.repository.update(member.clone())?;
        Ok(member)
    }

    /// Administrative status change: activate, suspend, or deactivate.
    pub fn set_status(
        &self,
        actor: &Principal,
        member_id: &MemberId,
        status: MemberStatus,
    ) -> Result<MemberRecord, FundError> {
        require_admin(actor)?;

        if status == MemberStatus::Pending {
            return Err(FundError::validation(
                "pending is not an assignable member status",
            ));
        }

        let mut member = self.fetch_member(member_id)?;
        member.status = status;
        self.repository.update(member.clone())?;
        Ok(member)
    }

    pub fn get(&self, actor: &Principal, member_id: &MemberId) -> Result<MemberRecord, FundError> {
        let member = self.fetch_member(member_id)?;
        if !actor.is_admin() && member.principal_id != actor.id {
            return Err(FundError::forbidden(
                "not authorized to view this member profile",
            ));
        }
        Ok(member)
    }

    /// Member profile linked to the calling account, if any.
    pub fn get_own(&self, actor: &Principal) -> Result<MemberRecord, FundError> {
        self.repository
            .fetch_by_principal(&actor.id)?
            .ok_or_else(|| FundError::not_found("member profile for principal", actor.id.0.clone()))
    }

    pub fn list(
        &self,
        actor: &Principal,
        filter: &MemberFilter,
        page: PageRequest,
    ) -> Result<Page<MemberRecord>, FundError> {
        require_admin(actor)?;
        Ok(self.repository.list(filter, page)?)
    }

    fn fetch_member(&self, member_id: &MemberId) -> Result<MemberRecord, FundError> {
        self.repository
            .fetch(member_id)?
            .ok_or_else(|| FundError::not_found("member", member_id.0.clone()))
    }

    fn next_member_id(&self) -> Result<MemberId, FundError> {
        let existing = self.repository.member_ids()?;
        let mut id = ids::next_id(
            MEMBER_ID_PREFIX,
            MEMBER_ID_WIDTH,
            existing.iter().map(String::as_str),
        )?;

        // Re-check for collision and step past occupied slots before
        // handing the identifier to the insert.
        while self.repository.fetch(&MemberId(id.clone()))?.is_some() {
            let value = ids::sequence_value(MEMBER_ID_PREFIX, &id)?;
            id = ids::format_id(MEMBER_ID_PREFIX, MEMBER_ID_WIDTH, value + 1);
        }

        Ok(MemberId(id))
    }
}

fn require_admin(actor: &Principal) -> Result<(), FundError> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(FundError::forbidden("administrator role required"))
    }
}

fn validate_profile(submission: &ProfileSubmission) -> Result<(), FundError> {
    if submission.id_number.trim().is_empty() {
        return Err(FundError::validation("national ID number is required"));
    }

    if submission.next_of_kin.len() != REQUIRED_NEXT_OF_KIN {
        return Err(FundError::validation(format!(
            "exactly {REQUIRED_NEXT_OF_KIN} next-of-kin contacts are required, found {}",
            submission.next_of_kin.len()
        )));
    }

    for kin in &submission.next_of_kin {
        if kin.name.trim().is_empty() || kin.phone.trim().is_empty() {
            return Err(FundError::validation(
                "next-of-kin entries require a name and phone number",
            ));
        }
    }

    for person in &submission.covered_persons {
        if person.name.trim().is_empty() {
            return Err(FundError::validation("covered persons require a name"));
        }
    }

    Ok(())
}
