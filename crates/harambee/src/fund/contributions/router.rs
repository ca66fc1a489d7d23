use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use uuid::Uuid;

use crate::fund::auth::Principal;
use crate::fund::cases::{CaseId, CaseRepository};
use crate::fund::error::FundError;
use crate::fund::members::{MemberId, MemberRepository};

use super::domain::{ContributionId, PaymentRequest, ProbationId, VerifyOutcome};
use super::repository::{ContributionRepository, ProbationRepository};
use super::service::ContributionService;

/// Router builder exposing contribution and probation endpoints.
pub fn contribution_router<T, P, M, C>(service: Arc<ContributionService<T, P, M, C>>) -> Router
where
    T: ContributionRepository + 'static,
    P: ProbationRepository + 'static,
    M: MemberRepository + 'static,
    C: CaseRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/contributions",
            post(record_payment_handler::<T, P, M, C>),
        )
        .route(
            "/api/v1/contributions/sweep",
            post(sweep_handler::<T, P, M, C>),
        )
        .route(
            "/api/v1/contributions/:contribution_id/verify",
            patch(verify_handler::<T, P, M, C>),
        )
        .route(
            "/api/v1/contributions/member/:member_id",
            get(member_contributions_handler::<T, P, M, C>),
        )
        .route(
            "/api/v1/contributions/case/:case_id",
            get(case_contributions_handler::<T, P, M, C>),
        )
        .route(
            "/api/v1/probations/:probation_id/resolve",
            post(resolve_probation_handler::<T, P, M, C>),
        )
        .route(
            "/api/v1/probations/member/:member_id",
            get(member_probations_handler::<T, P, M, C>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct VerifyRequest {
    outcome: VerifyOutcome,
    #[serde(default)]
    notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SweepRequest {
    /// Sweep date override for deterministic processing; defaults to the
    /// server's current date.
    #[serde(default)]
    today: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ResolveProbationRequest {
    #[serde(default)]
    end_date: Option<NaiveDate>,
}

async fn record_payment_handler<T, P, M, C>(
    State(service): State<Arc<ContributionService<T, P, M, C>>>,
    principal: Principal,
    Json(request): Json<PaymentRequest>,
) -> Result<impl IntoResponse, FundError>
where
    T: ContributionRepository + 'static,
    P: ProbationRepository + 'static,
    M: MemberRepository + 'static,
    C: CaseRepository + 'static,
{
    let today = Local::now().date_naive();
    let contribution = service.record_payment(&principal, request, today)?;
    Ok((StatusCode::CREATED, Json(contribution)))
}

async fn verify_handler<T, P, M, C>(
    State(service): State<Arc<ContributionService<T, P, M, C>>>,
    principal: Principal,
    Path(contribution_id): Path<Uuid>,
    Json(request): Json<VerifyRequest>,
) -> Result<impl IntoResponse, FundError>
where
    T: ContributionRepository + 'static,
    P: ProbationRepository + 'static,
    M: MemberRepository + 'static,
    C: CaseRepository + 'static,
{
    let today = Local::now().date_naive();
    let contribution = service.verify(
        &principal,
        &ContributionId(contribution_id),
        request.outcome,
        request.notes,
        today,
    )?;
    Ok(Json(contribution))
}

async fn sweep_handler<T, P, M, C>(
    State(service): State<Arc<ContributionService<T, P, M, C>>>,
    principal: Principal,
    request: Option<Json<SweepRequest>>,
) -> Result<impl IntoResponse, FundError>
where
    T: ContributionRepository + 'static,
    P: ProbationRepository + 'static,
    M: MemberRepository + 'static,
    C: CaseRepository + 'static,
{
    if !principal.is_admin() {
        return Err(FundError::forbidden("administrator role required"));
    }
    let request = request.map(|Json(request)| request).unwrap_or_default();
    let today = request.today.unwrap_or_else(|| Local::now().date_naive());
    let probations = service.sweep_overdue(today)?;
    Ok(Json(probations))
}

async fn member_contributions_handler<T, P, M, C>(
    State(service): State<Arc<ContributionService<T, P, M, C>>>,
    principal: Principal,
    Path(member_id): Path<String>,
) -> Result<impl IntoResponse, FundError>
where
    T: ContributionRepository + 'static,
    P: ProbationRepository + 'static,
    M: MemberRepository + 'static,
    C: CaseRepository + 'static,
{
    let contributions = service.member_contributions(&principal, &MemberId(member_id))?;
    Ok(Json(contributions))
}

async fn case_contributions_handler<T, P, M, C>(
    State(service): State<Arc<ContributionService<T, P, M, C>>>,
    principal: Principal,
    Path(case_id): Path<String>,
) -> Result<impl IntoResponse, FundError>
where
    T: ContributionRepository + 'static,
    P: ProbationRepository + 'static,
    M: MemberRepository + 'static,
    C: CaseRepository + 'static,
{
    let contributions = service.case_contributions(&principal, &CaseId(case_id))?;
    Ok(Json(contributions))
}

async fn resolve_probation_handler<T, P, M, C>(
    State(service): State<Arc<ContributionService<T, P, M, C>>>,
    principal: Principal,
    Path(probation_id): Path<Uuid>,
    request: Option<Json<ResolveProbationRequest>>,
) -> Result<impl IntoResponse, FundError>
where
    T: ContributionRepository + 'static,
    P: ProbationRepository + 'static,
    M: MemberRepository + 'static,
    C: CaseRepository + 'static,
{
    let request = request.map(|Json(request)| request).unwrap_or_default();
    let today = Local::now().date_naive();
    let probation = service.resolve_probation(
        &principal,
        &ProbationId(probation_id),
        request.end_date,
        today,
    )?;
    Ok(Json(probation))
}

async fn member_probations_handler<T, P, M, C>(
    State(service): State<Arc<ContributionService<T, P, M, C>>>,
    principal: Principal,
    Path(member_id): Path<String>,
) -> Result<impl IntoResponse, FundError>
where
    T: ContributionRepository + 'static,
    P: ProbationRepository + 'static,
    M: MemberRepository + 'static,
    C: CaseRepository + 'static,
{
    let probations = service.member_probations(&principal, &MemberId(member_id))?;
    Ok(Json(probations))
}
