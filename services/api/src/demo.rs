use crate::infra::{parse_date, LoggingNotifier};
use chrono::{Duration, Local, NaiveDate};
use clap::Args;
use harambee::config::FundPolicy;
use harambee::error::AppError;
use harambee::fund::auth::{Principal, PrincipalId};
use harambee::fund::cases::{
    CaseService, CaseStatus, CaseSubmission, CaseType, ContactRole, UrgencyLevel,
    VerificationContact,
};
use harambee::fund::contributions::{
    ContributionRepository, ContributionService, PaymentRequest, VerifyOutcome,
};
use harambee::fund::members::{
    MemberRecord, MemberService, NextOfKin, ProfileSubmission, ProvisionMemberRequest,
};
use harambee::fund::memory::{InMemoryDocumentStore, InMemoryFundStore};
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Day the demo case is filed and approved (YYYY-MM-DD). Defaults to
    /// today.
    #[arg(long, value_parser = parse_date)]
    pub(crate) start_date: Option<NaiveDate>,
}

/// Drive the full fund lifecycle in memory: provision members, file and
/// approve a case, record one contribution, and sweep the missed deadlines
/// into probation.
pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let day_zero = args
        .start_date
        .unwrap_or_else(|| Local::now().date_naive());

    let store = Arc::new(InMemoryFundStore::new());
    let notifier = Arc::new(LoggingNotifier);
    let policy = FundPolicy::default();
    let admin = Principal::admin("acct-admin");

    let members = MemberService::new(store.clone(), notifier.clone(), policy.clone());
    let cases = CaseService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        Arc::new(InMemoryDocumentStore::default()),
        notifier,
        policy.clone(),
    );
    let contributions =
        ContributionService::new(store.clone(), store.clone(), store.clone(), store.clone());

    println!("Harambee fund demo");
    println!("Day zero: {day_zero}\n");

    let names = ["Wanjiku Kamau", "Otieno Ouma", "Achieng Nyong'o", "Baraka Mwende"];
    let mut roster: Vec<MemberRecord> = Vec::new();
    for (index, name) in names.iter().enumerate() {
        let account = format!("acct-{}", index + 1);
        let provisioned = members
            .provision(
                &admin,
                ProvisionMemberRequest {
                    principal_id: PrincipalId(account.clone()),
                    full_name: name.to_string(),
                    phone: format!("+25470000000{index}"),
                    email: format!("member{}@harambee.example", index + 1),
                },
                day_zero,
            )
            .map_err(AppError::from)?;
        let activated = members
            .complete_profile(
                &Principal::member(account),
                &provisioned.member_id,
                demo_profile(),
                day_zero,
            )
            .map_err(AppError::from)?;
        println!(
            "Provisioned {} as {} ({})",
            activated.full_name,
            activated.member_id.0,
            activated.status.label()
        );
        roster.push(activated);
    }

    let affected = &roster[0];
    let filer = Principal::member(roster[3].principal_id.0.clone());
    let case = cases
        .submit(&filer, demo_submission(affected), day_zero)
        .map_err(AppError::from)?;
    println!(
        "\nCase {} (#{}) filed for {} by {}",
        case.case_id.0, case.case_number, affected.full_name, roster[3].full_name
    );

    let approved = cases
        .transition_status(&admin, &case.case_id, CaseStatus::Approved, None, day_zero)
        .map_err(AppError::from)?;
    let due = approved
        .due_date
        .unwrap_or(day_zero + Duration::days(policy.default_duration_days));
    println!(
        "Approved: contribution window {} -> {}",
        approved.start_date.map(|d| d.to_string()).unwrap_or_default(),
        due
    );

    let obligations = store
        .list_by_case(&case.case_id)
        .map_err(harambee::fund::FundError::from)
        .map_err(AppError::from)?;
    println!("Generated {} obligations of {} each:", obligations.len(), policy.contribution_amount);
    for row in &obligations {
        println!("- {} due {} ({})", row.member_id.0, row.deadline, row.status.label());
    }

    let payer = &roster[1];
    contributions
        .record_payment(
            &admin,
            PaymentRequest {
                case_id: case.case_id.clone(),
                member_id: payer.member_id.clone(),
                amount: None,
                payment_reference: Some("MPESA-DEMO-001".to_string()),
            },
            day_zero + Duration::days(3),
        )
        .map_err(AppError::from)?;
    let row = store
        .find_by_case_member(&case.case_id, &payer.member_id)
        .map_err(harambee::fund::FundError::from)
        .map_err(AppError::from)?
        .ok_or_else(|| {
            AppError::from(harambee::fund::FundError::not_found(
                "contribution obligation",
                payer.member_id.0.clone(),
            ))
        })?;
    contributions
        .verify(
            &admin,
            &row.id,
            VerifyOutcome::Completed,
            Some("reference checks out".to_string()),
            day_zero + Duration::days(4),
        )
        .map_err(AppError::from)?;
    println!("\n{} paid and was verified", payer.full_name);

    let sweep_day = due + Duration::days(1);
    let probations = contributions
        .sweep_overdue(sweep_day)
        .map_err(AppError::from)?;
    println!("\nSweep on {sweep_day}: {} members fell overdue", probations.len());
    for probation in &probations {
        println!("- {}: {}", probation.member_id.0, probation.reason);
    }

    if let Some(first) = probations.first() {
        contributions
            .resolve_probation(&admin, &first.id, None, sweep_day + Duration::days(7))
            .map_err(AppError::from)?;
        println!(
            "\nResolved the probation for {} a week later",
            first.member_id.0
        );
    }

    Ok(())
}

fn demo_profile() -> ProfileSubmission {
    ProfileSubmission {
        date_of_birth: NaiveDate::from_ymd_opt(1988, 7, 4).unwrap_or_default(),
        id_number: "34567890".to_string(),
        occupation: Some("Trader".to_string()),
        residence: Some("Kisumu".to_string()),
        family: Vec::new(),
        next_of_kin: vec![
            NextOfKin {
                name: "Akinyi Ouma".to_string(),
                relationship: "spouse".to_string(),
                phone: "+254722000001".to_string(),
                email: None,
                priority: 0,
            },
            NextOfKin {
                name: "Juma Ouma".to_string(),
                relationship: "brother".to_string(),
                phone: "+254722000002".to_string(),
                email: None,
                priority: 0,
            },
        ],
        covered_persons: Vec::new(),
    }
}

fn demo_submission(affected: &MemberRecord) -> CaseSubmission {
    CaseSubmission {
        member_id: affected.member_id.clone(),
        case_type: CaseType::Bereavement,
        description: "Sudden loss of the family breadwinner".to_string(),
        reporting_reason: "Family requires support with funeral costs".to_string(),
        incident_date: NaiveDate::from_ymd_opt(2025, 5, 28).unwrap_or_default(),
        urgency: UrgencyLevel::High,
        required_amount: 50_000,
        contacts: ContactRole::ordered()
            .into_iter()
            .map(|role| VerificationContact {
                role,
                name: format!("{} contact", role.label()),
                phone: "+254711000000".to_string(),
                email: None,
                relationship: None,
            })
            .collect(),
    }
}
