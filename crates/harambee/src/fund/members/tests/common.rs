use std::sync::Arc;

use chrono::NaiveDate;

use crate::config::FundPolicy;
use crate::fund::auth::{Principal, PrincipalId};
use crate::fund::members::domain::{NextOfKin, ProfileSubmission, ProvisionMemberRequest};
use crate::fund::members::service::MemberService;
use crate::fund::memory::{InMemoryFundStore, RecordingNotifier};

pub(super) fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 1).expect("valid date")
}

pub(super) fn admin() -> Principal {
    Principal::admin("acct-admin")
}

pub(super) fn build_service() -> (
    MemberService<InMemoryFundStore, RecordingNotifier>,
    Arc<InMemoryFundStore>,
    Arc<RecordingNotifier>,
) {
    let store = Arc::new(InMemoryFundStore::new());
    let notifier = Arc::new(RecordingNotifier::default());
    let service = MemberService::new(store.clone(), notifier.clone(), FundPolicy::default());
    (service, store, notifier)
}

pub(super) fn provision_request(suffix: &str) -> ProvisionMemberRequest {
    ProvisionMemberRequest {
        principal_id: PrincipalId(format!("acct-{suffix}")),
        full_name: format!("Member {suffix}"),
        phone: "+254700000001".to_string(),
        email: format!("member.{suffix}@example.org"),
    }
}

pub(super) fn next_of_kin(name: &str) -> NextOfKin {
    NextOfKin {
        name: name.to_string(),
        relationship: "sibling".to_string(),
        phone: "+254700000002".to_string(),
        email: None,
        priority: 0,
    }
}

pub(super) fn profile_submission() -> ProfileSubmission {
    ProfileSubmission {
        date_of_birth: NaiveDate::from_ymd_opt(1990, 3, 12).expect("valid date"),
        id_number: "12345678".to_string(),
        occupation: Some("Nurse".to_string()),
        residence: Some("Nairobi".to_string()),
        family: Vec::new(),
        next_of_kin: vec![next_of_kin("Amina Odhiambo"), next_of_kin("Brian Odhiambo")],
        covered_persons: Vec::new(),
    }
}
