use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::fund::auth::PrincipalId;

/// Identifier wrapper for registered members (`HMB-0001`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemberId(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberStatus {
    Pending,
    Active,
    Inactive,
    Suspended,
}

impl MemberStatus {
    pub const fn label(self) -> &'static str {
        match self {
            MemberStatus::Pending => "pending",
            MemberStatus::Active => "active",
            MemberStatus::Inactive => "inactive",
            MemberStatus::Suspended => "suspended",
        }
    }
}

/// Repository record for a member of the fund.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberRecord {
    pub member_id: MemberId,
    /// Account that signs in as this member. Supplied by the auth
    /// collaborator at provisioning time.
    pub principal_id: PrincipalId,
    pub full_name: String,
    pub phone: String,
    pub email: String,
    pub status: MemberStatus,
    pub join_date: NaiveDate,
    pub profile_completed: bool,
    /// Write-once snapshot captured at profile completion.
    pub profile: Option<MemberProfile>,
    pub on_probation: bool,
}

impl MemberRecord {
    pub fn status_view(&self) -> MemberView {
        MemberView {
            member_id: self.member_id.clone(),
            full_name: self.full_name.clone(),
            email: self.email.clone(),
            status: self.status.label(),
            join_date: self.join_date,
            profile_completed: self.profile_completed,
            on_probation: self.on_probation,
        }
    }
}

/// Immutable profile captured exactly once, when the member activates their
/// account. Never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberProfile {
    pub date_of_birth: NaiveDate,
    pub id_number: String,
    pub occupation: Option<String>,
    pub residence: Option<String>,
    pub family: Vec<FamilyMember>,
    pub next_of_kin: Vec<NextOfKin>,
    pub covered_persons: Vec<CoveredPerson>,
    pub completed_on: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FamilyType {
    Nuclear,
    Sibling,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FamilyMember {
    pub family_type: FamilyType,
    pub name: String,
    pub relationship: String,
    pub date_of_birth: Option<NaiveDate>,
}

/// Emergency contact; exactly two are captured, in priority order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NextOfKin {
    pub name: String,
    pub relationship: String,
    pub phone: String,
    pub email: Option<String>,
    pub priority: u8,
}

/// Dependant covered by the member's benefits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoveredPerson {
    pub name: String,
    pub relationship: String,
    pub date_of_birth: Option<NaiveDate>,
}

/// Administrative request to provision a new member account.
#[derive(Debug, Clone, Deserialize)]
pub struct ProvisionMemberRequest {
    pub principal_id: PrincipalId,
    pub full_name: String,
    pub phone: String,
    pub email: String,
}

/// Member-supplied payload for the one-shot profile completion step.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileSubmission {
    pub date_of_birth: NaiveDate,
    pub id_number: String,
    #[serde(default)]
    pub occupation: Option<String>,
    #[serde(default)]
    pub residence: Option<String>,
    #[serde(default)]
    pub family: Vec<FamilyMember>,
    pub next_of_kin: Vec<NextOfKin>,
    #[serde(default)]
    pub covered_persons: Vec<CoveredPerson>,
}

/// Sanitized representation of a member for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct MemberView {
    pub member_id: MemberId,
    pub full_name: String,
    pub email: String,
    pub status: &'static str,
    pub join_date: NaiveDate,
    pub profile_completed: bool,
    pub on_probation: bool,
}

/// Listing filter for the administrative member directory.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MemberFilter {
    pub status: Option<MemberStatus>,
    /// Case-insensitive substring match over name, e-mail, and member ID.
    pub search: Option<String>,
}

impl MemberFilter {
    pub fn matches(&self, record: &MemberRecord) -> bool {
        if let Some(status) = self.status {
            if record.status != status {
                return false;
            }
        }
        if let Some(search) = &self.search {
            let needle = search.to_ascii_lowercase();
            let haystacks = [
                record.full_name.to_ascii_lowercase(),
                record.email.to_ascii_lowercase(),
                record.member_id.0.to_ascii_lowercase(),
            ];
            if !haystacks.iter().any(|value| value.contains(&needle)) {
                return false;
            }
        }
        true
    }
}
