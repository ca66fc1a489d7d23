use std::sync::Arc;

use chrono::{Duration, NaiveDate};

use crate::config::FundPolicy;
use crate::fund::auth::{Principal, PrincipalId};
use crate::fund::cases::domain::{CaseId, CaseRecord, CaseStatus, CaseSubmission, CaseType};
use crate::fund::cases::service::CaseService;
use crate::fund::contributions::service::ContributionService;
use crate::fund::members::domain::{MemberId, MemberRecord, MemberStatus};
use crate::fund::members::repository::MemberRepository;
use crate::fund::memory::{InMemoryDocumentStore, InMemoryFundStore, RecordingNotifier};

pub(super) type TestContributionService = ContributionService<
    InMemoryFundStore,
    InMemoryFundStore,
    InMemoryFundStore,
    InMemoryFundStore,
>;

pub(super) struct TestEnv {
    pub(super) service: Arc<TestContributionService>,
    pub(super) cases: Arc<
        CaseService<
            InMemoryFundStore,
            InMemoryFundStore,
            InMemoryFundStore,
            InMemoryDocumentStore,
            RecordingNotifier,
        >,
    >,
    pub(super) store: Arc<InMemoryFundStore>,
}

pub(super) fn build_env() -> TestEnv {
    let store = Arc::new(InMemoryFundStore::new());
    let service = Arc::new(ContributionService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
    ));
    let cases = Arc::new(CaseService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        Arc::new(InMemoryDocumentStore::default()),
        Arc::new(RecordingNotifier::default()),
        FundPolicy::default(),
    ));
    TestEnv {
        service,
        cases,
        store,
    }
}

pub(super) fn day_zero() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 1).expect("valid date")
}

pub(super) fn day(offset: i64) -> NaiveDate {
    day_zero() + Duration::days(offset)
}

pub(super) fn admin() -> Principal {
    Principal::admin("acct-admin")
}

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

/// File and approve a case on day zero, generating the obligation batch.
/// The filer principal is `acct-99` and carries no member profile, so every
/// seeded active member is obligated.
pub(super) fn approved_case(env: &TestEnv, affected: &MemberId) -> CaseRecord {
    let filer = Principal::member("acct-99");
    let submission = CaseSubmission {
        member_id: affected.clone(),
        case_type: CaseType::MedicalEmergency,
        description: "Emergency surgery after a road accident".to_string(),
        reporting_reason: "Member hospitalized and unable to meet costs".to_string(),
        incident_date: day_zero(),
        urgency: crate::fund::cases::domain::UrgencyLevel::High,
        required_amount: 80_000,
        contacts: contacts(),
    };
    let case = env
        .cases
        .submit(&filer, submission, day_zero())
        .expect("case files");
    env.cases
        .transition_status(&admin(), &case.case_id, CaseStatus::Approved, None, day_zero())
        .expect("approval succeeds")
}

fn contacts() -> Vec<crate::fund::cases::domain::VerificationContact> {
    use crate::fund::cases::domain::{ContactRole, VerificationContact};
    ContactRole::ordered()
        .into_iter()
        .map(|role| VerificationContact {
            role,
            name: format!("{} contact", role.label()),
            phone: "+254711000000".to_string(),
            email: None,
            relationship: None,
        })
        .collect()
}

pub(super) fn contribution_for(
    env: &TestEnv,
    case_id: &CaseId,
    member_id: &MemberId,
) -> crate::fund::contributions::ContributionRecord {
    use crate::fund::contributions::repository::ContributionRepository;
    env.store
        .find_by_case_member(case_id, member_id)
        .expect("lookup succeeds")
        .expect("obligation exists")
}
