use super::common::*;
use crate::fund::auth::Principal;
use crate::fund::cases::domain::{CaseId, CasePatch, CaseStatus, ContactRole, UrgencyLevel};
use crate::fund::cases::repository::CaseRepository;
use crate::fund::contributions::repository::ContributionRepository;
use crate::fund::contributions::ContributionStatus;
use crate::fund::error::FundError;
use crate::fund::members::MemberId;
use chrono::Duration;

#[test]
fn submit_rejects_unknown_member() {
    let env = build_env();
    let filer = Principal::member("acct-9");

    match env.service.submit(
        &filer,
        submission(&MemberId("HMB-0099".to_string())),
        day_zero(),
    ) {
        Err(FundError::NotFound { entity, .. }) => assert_eq!(entity, "member"),
        other => panic!("expected not found, got {other:?}"),
    }
}

#[test]
fn submit_requires_every_contact_role() {
    let env = build_env();
    let member = seed_active_member(&env.store, 1);
    let filer = Principal::member("acct-9");

    let mut incomplete = submission(&member.member_id);
    incomplete
        .contacts
        .retain(|contact| contact.role != ContactRole::Referee);

    match env.service.submit(&filer, incomplete, day_zero()) {
        Err(FundError::Validation(message)) => assert!(message.contains("referee")),
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn submit_rejects_duplicate_contact_roles() {
    let env = build_env();
    let member = seed_active_member(&env.store, 1);
    let filer = Principal::member("acct-9");

    let mut doubled = submission(&member.member_id);
    doubled.contacts.push(contact(ContactRole::Chief, "Second Chief"));

    match env.service.submit(&filer, doubled, day_zero()) {
        Err(FundError::Validation(message)) => assert!(message.contains("chief")),
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn submit_rejects_short_narratives() {
    let env = build_env();
    let member = seed_active_member(&env.store, 1);
    let filer = Principal::member("acct-9");

    let mut terse = submission(&member.member_id);
    terse.description = "Too short".to_string();

    match env.service.submit(&filer, terse, day_zero()) {
        Err(FundError::Validation(message)) => assert!(message.contains("description")),
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn submit_assigns_sequential_identifiers() {
    let env = build_env();
    let member = seed_active_member(&env.store, 1);
    let filer = Principal::member("acct-9");

    let first = env
        .service
        .submit(&filer, submission(&member.member_id), day_zero())
        .expect("first case files");
    let second = env
        .service
        .submit(&filer, submission(&member.member_id), day_zero())
        .expect("second case files");

    assert_eq!(first.case_id.0, "CASE-001");
    assert_eq!(second.case_id.0, "CASE-002");
    assert_eq!(first.case_number, 1);
    assert_eq!(second.case_number, 2);
    assert_eq!(first.status, CaseStatus::Pending);
    assert_eq!(first.duration_days, 14);
    assert!(first.start_date.is_none());
    assert!(first.due_date.is_none());
    for role in ContactRole::ordered() {
        assert!(first.contact(role).is_some());
    }
}

#[test]
fn transition_is_forbidden_for_non_admins_regardless_of_ownership() {
    let env = build_env();
    let member = seed_active_member(&env.store, 1);
    let filer = Principal::member("acct-9");
    let case = env
        .service
        .submit(&filer, submission(&member.member_id), day_zero())
        .expect("case files");

    // Even the filer cannot drive the review workflow.
    match env.service.transition_status(
        &filer,
        &case.case_id,
        CaseStatus::UnderReview,
        None,
        day_zero(),
    ) {
        Err(FundError::Forbidden(_)) => {}
        other => panic!("expected forbidden, got {other:?}"),
    }
}

#[test]
fn first_approval_computes_window_and_generates_obligations() {
    let env = build_env();
    // Filer is themselves an active member and must be excluded.
    let filer_member = seed_active_member(&env.store, 9);
    let affected = seed_active_member(&env.store, 1);
    seed_active_member(&env.store, 2);
    seed_active_member(&env.store, 3);
    let filer = Principal::member(filer_member.principal_id.0.clone());

    let case = env
        .service
        .submit(&filer, submission(&affected.member_id), day_zero())
        .expect("case files");

    let approved = env
        .service
        .transition_status(
            &admin(),
            &case.case_id,
            CaseStatus::Approved,
            Some("verified with the chief".to_string()),
            day_zero(),
        )
        .expect("approval succeeds");

    let start = day_zero() + Duration::days(1);
    let due = start + Duration::days(14);
    assert_eq!(approved.approved_on, Some(day_zero()));
    assert_eq!(approved.start_date, Some(start));
    assert_eq!(approved.due_date, Some(due));
    assert_eq!(approved.reviewed_date, Some(day_zero()));

    let obligations = env
        .store
        .list_by_case(&case.case_id)
        .expect("obligations listed");
    // Four active members minus the filer.
    assert_eq!(obligations.len(), 3);
    assert!(obligations
        .iter()
        .all(|row| row.status == ContributionStatus::Pending
            && row.deadline == due
            && row.amount == 500));
    assert!(!obligations
        .iter()
        .any(|row| row.member_id == filer_member.member_id));
}

#[test]
fn reapproval_never_recomputes_dates_or_regenerates() {
    let env = build_env();
    seed_active_member(&env.store, 1);
    let affected = seed_active_member(&env.store, 2);
    let filer = Principal::member("acct-77");

    let case = env
        .service
        .submit(&filer, submission(&affected.member_id), day_zero())
        .expect("case files");
    let approved = env
        .service
        .transition_status(&admin(), &case.case_id, CaseStatus::Approved, None, day_zero())
        .expect("first approval");

    let later = day_zero() + Duration::days(6);
    let reapproved = env
        .service
        .transition_status(&admin(), &case.case_id, CaseStatus::Approved, None, later)
        .expect("re-approval is accepted");

    assert_eq!(reapproved.approved_on, approved.approved_on);
    assert_eq!(reapproved.start_date, approved.start_date);
    assert_eq!(reapproved.due_date, approved.due_date);

    let obligations = env
        .store
        .list_by_case(&case.case_id)
        .expect("obligations listed");
    assert_eq!(obligations.len(), 2);
}

#[test]
fn transitions_outside_the_graph_are_rejected() {
    let env = build_env();
    let affected = seed_active_member(&env.store, 1);
    let filer = Principal::member("acct-9");
    let case = env
        .service
        .submit(&filer, submission(&affected.member_id), day_zero())
        .expect("case files");

    match env.service.transition_status(
        &admin(),
        &case.case_id,
        CaseStatus::Disbursed,
        None,
        day_zero(),
    ) {
        Err(FundError::InvalidState(_)) => {}
        other => panic!("expected invalid state, got {other:?}"),
    }

    match env.service.transition_status(
        &admin(),
        &case.case_id,
        CaseStatus::Completed,
        None,
        day_zero(),
    ) {
        Err(FundError::InvalidState(_)) => {}
        other => panic!("expected invalid state, got {other:?}"),
    }
}

#[test]
fn rejected_cases_are_terminal() {
    let env = build_env();
    let affected = seed_active_member(&env.store, 1);
    let filer = Principal::member("acct-9");
    let case = env
        .service
        .submit(&filer, submission(&affected.member_id), day_zero())
        .expect("case files");

    env.service
        .transition_status(
            &admin(),
            &case.case_id,
            CaseStatus::Rejected,
            Some("insufficient verification".to_string()),
            day_zero(),
        )
        .expect("rejection succeeds");

    match env.service.transition_status(
        &admin(),
        &case.case_id,
        CaseStatus::Approved,
        None,
        day_zero(),
    ) {
        Err(FundError::InvalidState(_)) => {}
        other => panic!("expected invalid state, got {other:?}"),
    }
}

#[test]
fn filer_updates_are_limited_to_pending_cases() {
    let env = build_env();
    let affected = seed_active_member(&env.store, 1);
    let filer = Principal::member("acct-9");
    let case = env
        .service
        .submit(&filer, submission(&affected.member_id), day_zero())
        .expect("case files");

    let patch = CasePatch {
        urgency: Some(UrgencyLevel::Critical),
        ..CasePatch::default()
    };
    let updated = env
        .service
        .update(&filer, &case.case_id, patch)
        .expect("pending update succeeds");
    assert_eq!(updated.urgency, UrgencyLevel::Critical);

    match env.service.update(
        &Principal::member("acct-55"),
        &case.case_id,
        CasePatch::default(),
    ) {
        Err(FundError::Forbidden(_)) => {}
        other => panic!("expected forbidden, got {other:?}"),
    }

    env.service
        .transition_status(&admin(), &case.case_id, CaseStatus::UnderReview, None, day_zero())
        .expect("review starts");

    match env.service.update(&filer, &case.case_id, CasePatch::default()) {
        Err(FundError::InvalidState(_)) => {}
        other => panic!("expected invalid state, got {other:?}"),
    }
}

#[test]
fn contribution_window_is_frozen_after_approval() {
    let env = build_env();
    let affected = seed_active_member(&env.store, 1);
    let filer = Principal::member("acct-9");
    let case = env
        .service
        .submit(&filer, submission(&affected.member_id), day_zero())
        .expect("case files");

    let widened = env
        .service
        .update(
            &admin(),
            &case.case_id,
            CasePatch {
                duration_days: Some(21),
                ..CasePatch::default()
            },
        )
        .expect("admin adjusts the window before approval");
    assert_eq!(widened.duration_days, 21);

    env.service
        .transition_status(&admin(), &case.case_id, CaseStatus::Approved, None, day_zero())
        .expect("approval succeeds");

    match env.service.update(
        &admin(),
        &case.case_id,
        CasePatch {
            duration_days: Some(30),
            ..CasePatch::default()
        },
    ) {
        Err(FundError::InvalidState(_)) => {}
        other => panic!("expected invalid state, got {other:?}"),
    }
}

#[test]
fn delete_cascades_contributions_but_keeps_probations() {
    let env = build_env();
    seed_active_member(&env.store, 1);
    let affected = seed_active_member(&env.store, 2);
    let filer = Principal::member("acct-9");
    let case = env
        .service
        .submit(&filer, submission(&affected.member_id), day_zero())
        .expect("case files");
    env.service
        .transition_status(&admin(), &case.case_id, CaseStatus::Approved, None, day_zero())
        .expect("approval succeeds");
    assert_eq!(
        env.store
            .list_by_case(&case.case_id)
            .expect("rows listed")
            .len(),
        2
    );

    env.service
        .delete(&admin(), &case.case_id)
        .expect("admin deletes the case");

    assert!(CaseRepository::fetch(env.store.as_ref(), &case.case_id)
        .expect("fetch succeeds")
        .is_none());
    assert!(env
        .store
        .list_by_case(&case.case_id)
        .expect("rows listed")
        .is_empty());
}

#[test]
fn filer_may_delete_only_pending_cases() {
    let env = build_env();
    let affected = seed_active_member(&env.store, 1);
    let filer = Principal::member("acct-9");
    let case = env
        .service
        .submit(&filer, submission(&affected.member_id), day_zero())
        .expect("case files");

    env.service
        .transition_status(&admin(), &case.case_id, CaseStatus::UnderReview, None, day_zero())
        .expect("review starts");

    match env.service.delete(&filer, &case.case_id) {
        Err(FundError::InvalidState(_)) => {}
        other => panic!("expected invalid state, got {other:?}"),
    }
}

#[test]
fn receipt_confirmation_completes_disbursed_cases() {
    let env = build_env();
    let affected = seed_active_member(&env.store, 1);
    let filer = Principal::member("acct-9");
    let case = env
        .service
        .submit(&filer, submission(&affected.member_id), day_zero())
        .expect("case files");

    // Too early: the case has not been disbursed.
    match env
        .service
        .confirm_receipt(&filer, &case.case_id, day_zero())
    {
        Err(FundError::InvalidState(_)) => {}
        other => panic!("expected invalid state, got {other:?}"),
    }

    env.service
        .transition_status(&admin(), &case.case_id, CaseStatus::Approved, None, day_zero())
        .expect("approval succeeds");
    let disbursed_day = day_zero() + Duration::days(20);
    env.service
        .transition_status(
            &admin(),
            &case.case_id,
            CaseStatus::Disbursed,
            None,
            disbursed_day,
        )
        .expect("disbursement succeeds");

    match env.service.confirm_receipt(
        &Principal::member("acct-55"),
        &case.case_id,
        disbursed_day,
    ) {
        Err(FundError::Forbidden(_)) => {}
        other => panic!("expected forbidden, got {other:?}"),
    }

    let affected_principal = Principal::member(affected.principal_id.0.clone());
    let completed = env
        .service
        .confirm_receipt(&affected_principal, &case.case_id, disbursed_day)
        .expect("affected member confirms");
    assert_eq!(completed.status, CaseStatus::Completed);
    assert!(completed.confirmed_receipt);
    assert_eq!(completed.disbursed_on, Some(disbursed_day));
}

#[test]
fn documents_round_trip_through_the_store() {
    let env = build_env();
    let affected = seed_active_member(&env.store, 1);
    let filer = Principal::member("acct-9");
    let case = env
        .service
        .submit(&filer, submission(&affected.member_id), day_zero())
        .expect("case files");

    let with_document = env
        .service
        .attach_document(
            &filer,
            &case.case_id,
            "burial-permit.pdf",
            b"%PDF-1.7 permit",
            day_zero(),
        )
        .expect("attachment succeeds");
    assert_eq!(with_document.documents.len(), 1);
    let document = with_document.documents[0].clone();
    assert!(env.documents.contains(&document.storage_key));

    let without_document = env
        .service
        .remove_document(&filer, &case.case_id, document.id)
        .expect("removal succeeds");
    assert!(without_document.documents.is_empty());
    assert!(!env.documents.contains(&document.storage_key));
}

#[test]
fn list_scopes_non_admins_to_their_own_filings() {
    let env = build_env();
    let affected = seed_active_member(&env.store, 1);
    let filer = Principal::member("acct-9");
    let other_filer = Principal::member("acct-8");
    env.service
        .submit(&filer, submission(&affected.member_id), day_zero())
        .expect("first case files");
    env.service
        .submit(&other_filer, submission(&affected.member_id), day_zero())
        .expect("second case files");

    let own = env
        .service
        .list(
            &filer,
            crate::fund::cases::domain::CaseFilter::default(),
            crate::fund::repository::PageRequest::default(),
        )
        .expect("listing succeeds");
    assert_eq!(own.total, 1);

    let all = env
        .service
        .list(
            &admin(),
            crate::fund::cases::domain::CaseFilter::default(),
            crate::fund::repository::PageRequest::default(),
        )
        .expect("listing succeeds");
    assert_eq!(all.total, 2);
}

#[test]
fn submission_notifies_filer_member_and_admin() {
    let env = build_env();
    let filer_member = seed_active_member(&env.store, 9);
    let affected = seed_active_member(&env.store, 1);
    let filer = Principal::member(filer_member.principal_id.0.clone());

    env.service
        .submit(&filer, submission(&affected.member_id), day_zero())
        .expect("case files");

    let sent = env.notifier.sent();
    let recipients: Vec<&str> = sent
        .iter()
        .map(|notification| notification.recipient.as_str())
        .collect();
    assert!(recipients.contains(&filer_member.email.as_str()));
    assert!(recipients.contains(&"admin@harambee.example"));
}

#[test]
fn notification_failures_never_fail_the_operation() {
    use crate::config::FundPolicy;
    use crate::fund::cases::service::CaseService;
    use crate::fund::memory::{InMemoryDocumentStore, InMemoryFundStore};
    use crate::fund::notify::{Notification, Notifier, NotifyError};
    use std::sync::Arc;

    struct FailingNotifier;

    impl Notifier for FailingNotifier {
        fn notify(&self, _notification: Notification) -> Result<(), NotifyError> {
            Err(NotifyError::Transport("smtp relay offline".to_string()))
        }
    }

    let store = Arc::new(InMemoryFundStore::new());
    let service = CaseService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        Arc::new(InMemoryDocumentStore::default()),
        Arc::new(FailingNotifier),
        FundPolicy::default(),
    );
    let member = seed_active_member(&store, 1);
    let filer = Principal::member("acct-9");

    let case = service
        .submit(&filer, submission(&member.member_id), day_zero())
        .expect("delivery failure must not surface");
    service
        .transition_status(&admin(), &case.case_id, CaseStatus::Approved, None, day_zero())
        .expect("approval survives a dead notifier");
}

#[test]
fn get_allows_admin_filer_and_affected_member_only() {
    let env = build_env();
    let affected = seed_active_member(&env.store, 1);
    let filer = Principal::member("acct-9");
    let case = env
        .service
        .submit(&filer, submission(&affected.member_id), day_zero())
        .expect("case files");
    let case_id = CaseId(case.case_id.0.clone());

    assert!(env.service.get(&filer, &case_id).is_ok());
    assert!(env.service.get(&admin(), &case_id).is_ok());
    assert!(env
        .service
        .get(&Principal::member(affected.principal_id.0.clone()), &case_id)
        .is_ok());
    match env.service.get(&Principal::member("acct-55"), &case_id) {
        Err(FundError::Forbidden(_)) => {}
        other => panic!("expected forbidden, got {other:?}"),
    }
}
