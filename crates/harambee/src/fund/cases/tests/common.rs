use std::sync::Arc;

use chrono::NaiveDate;

use crate::config::FundPolicy;
use crate::fund::auth::{Principal, PrincipalId};
use crate::fund::cases::domain::{CaseSubmission, CaseType, ContactRole, VerificationContact};
use crate::fund::cases::service::CaseService;
use crate::fund::members::domain::{MemberId, MemberRecord, MemberStatus};
use crate::fund::members::repository::MemberRepository;
use crate::fund::memory::{InMemoryDocumentStore, InMemoryFundStore, RecordingNotifier};

pub(super) type TestCaseService = CaseService<
    InMemoryFundStore,
    InMemoryFundStore,
    InMemoryFundStore,
    InMemoryDocumentStore,
    RecordingNotifier,
>;

pub(super) struct TestEnv {
    pub(super) service: Arc<TestCaseService>,
    pub(super) store: Arc<InMemoryFundStore>,
    pub(super) documents: Arc<InMemoryDocumentStore>,
    pub(super) notifier: Arc<RecordingNotifier>,
}

pub(super) fn build_env() -> TestEnv {
    let store = Arc::new(InMemoryFundStore::new());
    let documents = Arc::new(InMemoryDocumentStore::default());
    let notifier = Arc::new(RecordingNotifier::default());
    let service = Arc::new(CaseService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        documents.clone(),
        notifier.clone(),
        FundPolicy::default(),
    ));
    TestEnv {
        service,
        store,
        documents,
        notifier,
    }
}

pub(super) fn day_zero() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 1).expect("valid date")
}

pub(super) fn admin() -> Principal {
    Principal::admin("acct-admin")
}

/// Seed an active member directly in the store; `suffix` drives both the
/// member ID and the linked principal (`acct-<suffix>`).
pub(super) fn seed_active_member(store: &InMemoryFundStore, suffix: u32) -> MemberRecord {
    let record = MemberRecord {
        member_id: MemberId(format!("HMB-{suffix:04}")),
        principal_id: PrincipalId(format!("acct-{suffix}")),
        full_name: format!("Member {suffix}"),
        phone: "+254700000001".to_string(),
        email: format!("member.{suffix}@example.org"),
        status: MemberStatus::Active,
        join_date: day_zero(),
        profile_completed: true,
        profile: None,
        on_probation: false,
    };
    MemberRepository::insert(store, record).expect("member seeds")
}

pub(super) fn contact(role: ContactRole, name: &str) -> VerificationContact {
    VerificationContact {
        role,
        name: name.to_string(),
        phone: "+254711000000".to_string(),
        email: None,
        relationship: match role {
            ContactRole::Referee => Some("neighbor".to_string()),
            _ => None,
        },
    }
}

pub(super) fn all_contacts() -> Vec<VerificationContact> {
    vec![
        contact(ContactRole::VillageElder, "Elder Mwangi"),
        contact(ContactRole::AssistantChief, "Assistant Chief Njeri"),
        contact(ContactRole::Chief, "Chief Kamau"),
        contact(ContactRole::Referee, "Referee Atieno"),
    ]
}

pub(super) fn submission(member_id: &MemberId) -> CaseSubmission {
    CaseSubmission {
        member_id: member_id.clone(),
        case_type: CaseType::Bereavement,
        description: "Sudden loss of the family breadwinner".to_string(),
        reporting_reason: "Family requires support with funeral costs".to_string(),
        incident_date: day_zero(),
        urgency: crate::fund::cases::domain::UrgencyLevel::High,
        required_amount: 50_000,
        contacts: all_contacts(),
    }
}
