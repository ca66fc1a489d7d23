use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::fund::auth::PrincipalId;
use crate::fund::members::MemberId;

/// Identifier wrapper for support cases (`CASE-001`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CaseId(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseType {
    Bereavement,
    MedicalEmergency,
    Disability,
    FireDamage,
    NaturalDisaster,
    Other,
}

impl CaseType {
    pub const fn label(self) -> &'static str {
        match self {
            CaseType::Bereavement => "bereavement",
            CaseType::MedicalEmergency => "medical_emergency",
            CaseType::Disability => "disability",
            CaseType::FireDamage => "fire_damage",
            CaseType::NaturalDisaster => "natural_disaster",
            CaseType::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrgencyLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl UrgencyLevel {
    pub const fn label(self) -> &'static str {
        match self {
            UrgencyLevel::Low => "low",
            UrgencyLevel::Medium => "medium",
            UrgencyLevel::High => "high",
            UrgencyLevel::Critical => "critical",
        }
    }
}

/// Case review status. Transitions are validated centrally through
/// [`CaseStatus::can_transition_to`]; `completed` is reachable only via the
/// receipt-confirmation step, never by a direct status write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    Pending,
    UnderReview,
    Approved,
    Disbursed,
    Completed,
    Rejected,
}

impl CaseStatus {
    pub const fn label(self) -> &'static str {
        match self {
            CaseStatus::Pending => "pending",
            CaseStatus::UnderReview => "under_review",
            CaseStatus::Approved => "approved",
            CaseStatus::Disbursed => "disbursed",
            CaseStatus::Completed => "completed",
            CaseStatus::Rejected => "rejected",
        }
    }

    /// Allowed review-workflow edges. The `approved -> approved` self-edge
    /// lets repeated approval requests land on the one-shot side-effect
    /// guard instead of erroring.
    pub fn can_transition_to(self, next: CaseStatus) -> bool {
        use CaseStatus::*;
        matches!(
            (self, next),
            (Pending, UnderReview)
                | (Pending, Approved)
                | (Pending, Rejected)
                | (UnderReview, Approved)
                | (UnderReview, Rejected)
                | (Approved, Approved)
                | (Approved, Disbursed)
                | (Disbursed, Completed)
        )
    }
}

/// Fixed verification roles; a submission must carry one contact per role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactRole {
    VillageElder,
    AssistantChief,
    Chief,
    Referee,
}

impl ContactRole {
    pub const fn ordered() -> [Self; 4] {
        [
            Self::VillageElder,
            Self::AssistantChief,
            Self::Chief,
            Self::Referee,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            ContactRole::VillageElder => "village_elder",
            ContactRole::AssistantChief => "assistant_chief",
            ContactRole::Chief => "chief",
            ContactRole::Referee => "referee",
        }
    }
}

/// Community contact vouching for a reported case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationContact {
    pub role: ContactRole,
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    /// Relationship to the affected member; meaningful for referees.
    #[serde(default)]
    pub relationship: Option<String>,
}

/// Metadata for a file attached to a case; bytes live in the document
/// store collaborator. Deleted together with the case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseDocument {
    pub id: Uuid,
    pub name: String,
    pub storage_key: String,
    pub url: String,
    pub uploaded_on: NaiveDate,
}

/// Repository record for a support case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseRecord {
    pub case_id: CaseId,
    /// Independent human-reference sequence, increasing across all cases.
    pub case_number: u32,
    pub member_id: MemberId,
    /// Account that filed the report; may differ from the affected member.
    pub filed_by: PrincipalId,
    pub case_type: CaseType,
    pub description: String,
    pub reporting_reason: String,
    pub incident_date: NaiveDate,
    pub urgency: UrgencyLevel,
    pub status: CaseStatus,
    pub submitted_date: NaiveDate,
    pub reviewed_date: Option<NaiveDate>,
    pub reviewer_notes: Option<String>,
    /// Fundraising target for the case.
    pub required_amount: u32,
    /// Running total of verified contributions.
    pub collected_amount: u32,
    /// Contribution window applied at approval.
    pub duration_days: i64,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    /// One-shot marker: set on the first transition into `approved`, and the
    /// gate for all approval side effects.
    pub approved_on: Option<NaiveDate>,
    pub disbursed_on: Option<NaiveDate>,
    pub confirmed_receipt: bool,
    pub contacts: Vec<VerificationContact>,
    pub documents: Vec<CaseDocument>,
}

impl CaseRecord {
    pub fn contact(&self, role: ContactRole) -> Option<&VerificationContact> {
        self.contacts.iter().find(|contact| contact.role == role)
    }

    pub fn status_view(&self) -> CaseView {
        CaseView {
            case_id: self.case_id.clone(),
            case_number: self.case_number,
            member_id: self.member_id.clone(),
            case_type: self.case_type.label(),
            urgency: self.urgency.label(),
            status: self.status.label(),
            submitted_date: self.submitted_date,
            start_date: self.start_date,
            due_date: self.due_date,
            required_amount: self.required_amount,
            collected_amount: self.collected_amount,
            confirmed_receipt: self.confirmed_receipt,
        }
    }
}

/// Filer-supplied payload for a new case report.
#[derive(Debug, Clone, Deserialize)]
pub struct CaseSubmission {
    pub member_id: MemberId,
    pub case_type: CaseType,
    pub description: String,
    pub reporting_reason: String,
    pub incident_date: NaiveDate,
    #[serde(default = "default_urgency")]
    pub urgency: UrgencyLevel,
    pub required_amount: u32,
    pub contacts: Vec<VerificationContact>,
}

fn default_urgency() -> UrgencyLevel {
    UrgencyLevel::Medium
}

/// Partial update applied to an existing case.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CasePatch {
    pub description: Option<String>,
    pub reporting_reason: Option<String>,
    pub urgency: Option<UrgencyLevel>,
    /// Admin-only; rejected once the case has been approved.
    pub duration_days: Option<i64>,
    /// Admin-only; rejected once the case has been approved.
    pub required_amount: Option<u32>,
}

/// Sanitized case representation for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct CaseView {
    pub case_id: CaseId,
    pub case_number: u32,
    pub member_id: MemberId,
    pub case_type: &'static str,
    pub urgency: &'static str,
    pub status: &'static str,
    pub submitted_date: NaiveDate,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub required_amount: u32,
    pub collected_amount: u32,
    pub confirmed_receipt: bool,
}

/// Listing filter for case queries.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CaseFilter {
    pub status: Option<CaseStatus>,
    pub case_type: Option<CaseType>,
    pub urgency: Option<UrgencyLevel>,
    /// Restrict to cases filed by this account; forced for non-admin
    /// callers.
    #[serde(skip)]
    pub filed_by: Option<PrincipalId>,
}

impl CaseFilter {
    pub fn matches(&self, record: &CaseRecord) -> bool {
        if let Some(status) = self.status {
            if record.status != status {
                return false;
            }
        }
        if let Some(case_type) = self.case_type {
            if record.case_type != case_type {
                return false;
            }
        }
        if let Some(urgency) = self.urgency {
            if record.urgency != urgency {
                return false;
            }
        }
        if let Some(filed_by) = &self.filed_by {
            if &record.filed_by != filed_by {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states_have_no_outgoing_edges() {
        for next in [
            CaseStatus::Pending,
            CaseStatus::UnderReview,
            CaseStatus::Approved,
            CaseStatus::Disbursed,
            CaseStatus::Completed,
        ] {
            assert!(!CaseStatus::Rejected.can_transition_to(next));
            assert!(!CaseStatus::Completed.can_transition_to(next));
        }
    }

    #[test]
    fn review_path_is_permitted() {
        assert!(CaseStatus::Pending.can_transition_to(CaseStatus::UnderReview));
        assert!(CaseStatus::UnderReview.can_transition_to(CaseStatus::Approved));
        assert!(CaseStatus::Approved.can_transition_to(CaseStatus::Disbursed));
        assert!(CaseStatus::Disbursed.can_transition_to(CaseStatus::Completed));
    }

    #[test]
    fn reapproval_self_edge_is_permitted() {
        assert!(CaseStatus::Approved.can_transition_to(CaseStatus::Approved));
    }

    #[test]
    fn backwards_edges_are_rejected() {
        assert!(!CaseStatus::Approved.can_transition_to(CaseStatus::Pending));
        assert!(!CaseStatus::Disbursed.can_transition_to(CaseStatus::Approved));
        assert!(!CaseStatus::Pending.can_transition_to(CaseStatus::Disbursed));
    }
}
