use std::sync::Arc;

use chrono::NaiveDate;

use crate::fund::auth::Principal;
use crate::fund::cases::{CaseId, CaseRepository};
use crate::fund::error::FundError;
use crate::fund::members::{MemberId, MemberRepository};

use super::domain::{
    ContributionId, ContributionRecord, ContributionStatus, PaymentRequest, ProbationId,
    ProbationRecord, VerifyOutcome,
};
use super::repository::{ContributionRepository, ProbationRepository};

/// Service tracking contribution obligations and the probation ledger.
///
/// Obligation batches are created by case approval. Everything after that
/// happens here: payment recording, verification, the overdue sweep, and
/// probation resolution.
pub struct ContributionService<T, P, M, C> {
    contributions: Arc<T>,
    probations: Arc<P>,
    members: Arc<M>,
    cases: Arc<C>,
}

impl<T, P, M, C> ContributionService<T, P, M, C>
where
    T: ContributionRepository + 'static,
    P: ProbationRepository + 'static,
    M: MemberRepository + 'static,
    C: CaseRepository + 'static,
{
    pub fn new(contributions: Arc<T>, probations: Arc<P>, members: Arc<M>, cases: Arc<C>) -> Self {
        Self {
            contributions,
            probations,
            members,
            cases,
        }
    }

    /// Record a member's payment against their pending obligation (admin
    /// only). Recording is not verification: the row stays `pending` until
    /// an admin verifies it.
    pub fn record_payment(
        &self,
        actor: &Principal,
        request: PaymentRequest,
        today: NaiveDate,
    ) -> Result<ContributionRecord, FundError> {
        require_admin(actor)?;

        let mut contribution = self
            .contributions
            .find_by_case_member(&request.case_id, &request.member_id)?
            .ok_or_else(|| {
                FundError::not_found(
                    "contribution obligation",
                    format!("{} / {}", request.case_id.0, request.member_id.0),
                )
            })?;

        if contribution.status != ContributionStatus::Pending {
            return Err(FundError::invalid_state(format!(
                "contribution is {}, payments can be recorded only while pending",
                contribution.status.label()
            )));
        }

        if let Some(amount) = request.amount {
            if amount == 0 {
                return Err(FundError::validation("payment amount must be positive"));
            }
            contribution.amount = amount;
        }
        contribution.contribution_date = Some(today);
        contribution.payment_reference = request.payment_reference;

        self.contributions.update(contribution.clone())?;
        Ok(contribution)
    }

    /// Verify or reject a recorded contribution (admin only). Completion
    /// rolls the amount into the case's collected total; rejection clears
    /// the recorded payment and leaves the obligation open.
    pub fn verify(
        &self,
        actor: &Principal,
        contribution_id: &ContributionId,
        outcome: VerifyOutcome,
        notes: Option<String>,
        today: NaiveDate,
    ) -> Result<ContributionRecord, FundError> {
        require_admin(actor)?;

        let mut contribution = self
            .contributions
            .fetch(contribution_id)?
            .ok_or_else(|| {
                FundError::not_found("contribution", contribution_id.0.to_string())
            })?;

        if contribution.status != ContributionStatus::Pending {
            return Err(FundError::invalid_state(format!(
                "contribution is {}, only pending contributions can be verified",
                contribution.status.label()
            )));
        }

        let previous = contribution.clone();
        if let Some(notes) = notes {
            contribution.notes = Some(match contribution.notes.take() {
                Some(existing) => format!("{existing}\n{notes}"),
                None => notes,
            });
        }

        match outcome {
            VerifyOutcome::Completed => {
                contribution.status = ContributionStatus::Completed;
                contribution.contribution_date.get_or_insert(today);
                self.contributions.update(contribution.clone())?;

                if let Err(err) = self.credit_case(&contribution.case_id, contribution.amount) {
                    // Keep the row and the case total consistent.
                    self.contributions.update(previous)?;
                    return Err(err);
                }
            }
            VerifyOutcome::Rejected => {
                contribution.contribution_date = None;
                contribution.payment_reference = None;
                self.contributions.update(contribution.clone())?;
            }
        }

        Ok(contribution)
    }

    /// Promote overdue obligations into probation records.
    ///
    /// Externally triggered (admin endpoint or scheduler); takes no
    /// principal so a cron caller can invoke it directly. Running it twice
    /// with no time passing finds no pending rows the second time and
    /// creates nothing.
    pub fn sweep_overdue(&self, today: NaiveDate) -> Result<Vec<ProbationRecord>, FundError> {
        let overdue = self.contributions.pending_due_before(today)?;
        let mut created = Vec::with_capacity(overdue.len());

        for mut contribution in overdue {
            contribution.status = ContributionStatus::Overdue;
            self.contributions.update(contribution.clone())?;

            let probation = ProbationRecord {
                id: ProbationId::generate(),
                member_id: contribution.member_id.clone(),
                case_id: contribution.case_id.clone(),
                start_date: today,
                end_date: None,
                reason: format!(
                    "Missed contribution deadline for case {}",
                    contribution.case_id.0
                ),
                is_active: true,
            };
            let probation = self.probations.insert(probation)?;

            match self.members.fetch(&contribution.member_id)? {
                Some(mut member) => {
                    if !member.on_probation {
                        member.on_probation = true;
                        self.members.update(member)?;
                    }
                }
                None => {
                    tracing::warn!(
                        member = %contribution.member_id.0,
                        case = %contribution.case_id.0,
                        "overdue contribution references a missing member"
                    );
                }
            }

            created.push(probation);
        }

        Ok(created)
    }

    /// Close a probation record (admin only). The row is kept as an audit
    /// trail; the member's flag clears only when no active probation
    /// remains.
    pub fn resolve_probation(
        &self,
        actor: &Principal,
        probation_id: &ProbationId,
        end_date: Option<NaiveDate>,
        today: NaiveDate,
    ) -> Result<ProbationRecord, FundError> {
        require_admin(actor)?;

        let mut probation = self
            .probations
            .fetch(probation_id)?
            .ok_or_else(|| FundError::not_found("probation", probation_id.0.to_string()))?;

        if !probation.is_active {
            return Err(FundError::invalid_state(
                "probation record is already resolved",
            ));
        }

        let previous = probation.clone();
        probation.end_date = Some(end_date.unwrap_or(today));
        probation.is_active = false;
        self.probations.update(probation.clone())?;

        if let Err(err) = self.recompute_member_flag(&probation.member_id) {
            self.probations.update(previous)?;
            return Err(err);
        }

        Ok(probation)
    }

    /// Contribution history for a member; the member themselves or an admin.
    pub fn member_contributions(
        &self,
        actor: &Principal,
        member_id: &MemberId,
    ) -> Result<Vec<ContributionRecord>, FundError> {
        self.require_self_or_admin(actor, member_id)?;
        Ok(self.contributions.list_by_member(member_id)?)
    }

    /// All obligations generated for a case (admin only).
    pub fn case_contributions(
        &self,
        actor: &Principal,
        case_id: &CaseId,
    ) -> Result<Vec<ContributionRecord>, FundError> {
        require_admin(actor)?;
        if self.cases.fetch(case_id)?.is_none() {
            return Err(FundError::not_found("case", case_id.0.clone()));
        }
        Ok(self.contributions.list_by_case(case_id)?)
    }

    /// Probation history for a member; the member themselves or an admin.
    pub fn member_probations(
        &self,
        actor: &Principal,
        member_id: &MemberId,
    ) -> Result<Vec<ProbationRecord>, FundError> {
        self.require_self_or_admin(actor, member_id)?;
        Ok(self.probations.list_by_member(member_id)?)
    }

    fn credit_case(&self, case_id: &CaseId, amount: u32) -> Result<(), FundError> {
        let mut case = self
            .cases
            .fetch(case_id)?
            .ok_or_else(|| FundError::not_found("case", case_id.0.clone()))?;
        case.collected_amount += amount;
        self.cases.update(case)?;
        Ok(())
    }

    fn recompute_member_flag(&self, member_id: &MemberId) -> Result<(), FundError> {
        let mut member = self
            .members
            .fetch(member_id)?
            .ok_or_else(|| FundError::not_found("member", member_id.0.clone()))?;
        let still_active = !self.probations.active_for_member(member_id)?.is_empty();
        if member.on_probation != still_active {
            member.on_probation = still_active;
            self.members.update(member)?;
        }
        Ok(())
    }

    fn require_self_or_admin(
        &self,
        actor: &Principal,
        member_id: &MemberId,
    ) -> Result<(), FundError> {
        if actor.is_admin() {
            return Ok(());
        }
        let member = self
            .members
            .fetch(member_id)?
            .ok_or_else(|| FundError::not_found("member", member_id.0.clone()))?;
        if member.principal_id == actor.id {
            Ok(())
        } else {
            Err(FundError::forbidden(
                "not authorized to view this member's records",
            ))
        }
    }
}

fn require_admin(actor: &Principal) -> Result<(), FundError> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(FundError::forbidden("administrator role required"))
    }
}
