use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::fund::cases::CaseId;
use crate::fund::members::MemberId;

/// Row identifier for a contribution obligation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContributionId(pub Uuid);

impl ContributionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContributionStatus {
    Pending,
    Completed,
    Overdue,
}

impl ContributionStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ContributionStatus::Pending => "pending",
            ContributionStatus::Completed => "completed",
            ContributionStatus::Overdue => "overdue",
        }
    }
}

/// One member's owed share toward one approved case.
///
/// Rows are created in batches when a case is approved; at most one row
/// exists per (case, member) pair, and the case filer is never obligated for
/// their own filing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContributionRecord {
    pub id: ContributionId,
    pub case_id: CaseId,
    pub member_id: MemberId,
    pub amount: u32,
    pub deadline: NaiveDate,
    pub status: ContributionStatus,
    /// When the member actually paid; set by payment recording, not by
    /// verification.
    pub contribution_date: Option<NaiveDate>,
    pub payment_reference: Option<String>,
    pub notes: Option<String>,
}

impl ContributionRecord {
    /// Fresh pending obligation for an approval batch.
    pub fn obligation(
        case_id: CaseId,
        member_id: MemberId,
        amount: u32,
        deadline: NaiveDate,
    ) -> Self {
        Self {
            id: ContributionId::generate(),
            case_id,
            member_id,
            amount,
            deadline,
            status: ContributionStatus::Pending,
            contribution_date: None,
            payment_reference: None,
            notes: None,
        }
    }
}

/// Row identifier for a probation sanction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProbationId(pub Uuid);

impl ProbationId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Sanction recorded against a member who missed a contribution deadline.
/// Resolved probations keep their row as an audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbationRecord {
    pub id: ProbationId,
    pub member_id: MemberId,
    pub case_id: CaseId,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub reason: String,
    pub is_active: bool,
}

/// Admin decision applied to a pending contribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerifyOutcome {
    Completed,
    Rejected,
}

/// Admin request to record a member's payment against an obligation.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentRequest {
    pub case_id: CaseId,
    pub member_id: MemberId,
    /// Overrides the obligation amount when the payment differs from the
    /// uniform share.
    #[serde(default)]
    pub amount: Option<u32>,
    #[serde(default)]
    pub payment_reference: Option<String>,
}
