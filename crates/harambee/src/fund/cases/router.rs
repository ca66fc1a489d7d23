use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get, patch, post};
use axum::{Json, Router};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use uuid::Uuid;

use crate::fund::auth::Principal;
use crate::fund::contributions::repository::ContributionRepository;
use crate::fund::error::FundError;
use crate::fund::members::MemberRepository;
use crate::fund::notify::Notifier;
use crate::fund::repository::PageRequest;

use super::domain::{CaseFilter, CaseId, CasePatch, CaseStatus, CaseSubmission, CaseType, UrgencyLevel};
use super::repository::{CaseRepository, DocumentStore};
use super::service::CaseService;

/// Router builder exposing the case lifecycle endpoints.
pub fn case_router<C, M, T, S, N>(service: Arc<CaseService<C, M, T, S, N>>) -> Router
where
    C: CaseRepository + 'static,
    M: MemberRepository + 'static,
    T: ContributionRepository + 'static,
    S: DocumentStore + 'static,
    N: Notifier + 'static,
{
    Router::new()
        .route(
            "/api/v1/cases",
            post(submit_handler::<C, M, T, S, N>).get(list_handler::<C, M, T, S, N>),
        )
        .route(
            "/api/v1/cases/:case_id",
            get(get_handler::<C, M, T, S, N>)
                .patch(update_handler::<C, M, T, S, N>)
                .delete(delete_handler::<C, M, T, S, N>),
        )
        .route(
            "/api/v1/cases/:case_id/status",
            patch(status_handler::<C, M, T, S, N>),
        )
        .route(
            "/api/v1/cases/:case_id/confirm-receipt",
            post(confirm_receipt_handler::<C, M, T, S, N>),
        )
        .route(
            "/api/v1/cases/:case_id/documents",
            post(attach_document_handler::<C, M, T, S, N>),
        )
        .route(
            "/api/v1/cases/:case_id/documents/:document_id",
            delete(remove_document_handler::<C, M, T, S, N>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct CaseListQuery {
    #[serde(default)]
    skip: usize,
    #[serde(default = "default_limit")]
    limit: usize,
    #[serde(default)]
    status: Option<CaseStatus>,
    #[serde(default)]
    case_type: Option<CaseType>,
    #[serde(default)]
    urgency: Option<UrgencyLevel>,
}

fn default_limit() -> usize {
    50
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusTransitionRequest {
    status: CaseStatus,
    #[serde(default)]
    notes: Option<String>,
    /// Review date override for deterministic processing; defaults to the
    /// server's current date.
    #[serde(default)]
    today: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DocumentQuery {
    name: String,
}

async fn submit_handler<C, M, T, S, N>(
    State(service): State<Arc<CaseService<C, M, T, S, N>>>,
    principal: Principal,
    Json(submission): Json<CaseSubmission>,
) -> Result<impl IntoResponse, FundError>
where
    C: CaseRepository + 'static,
    M: MemberRepository + 'static,
    T: ContributionRepository + 'static,
    S: DocumentStore + 'static,
    N: Notifier + 'static,
{
    let today = Local::now().date_naive();
    let case = service.submit(&principal, submission, today)?;
    Ok((StatusCode::CREATED, Json(case)))
}

async fn list_handler<C, M, T, S, N>(
    State(service): State<Arc<CaseService<C, M, T, S, N>>>,
    principal: Principal,
    Query(query): Query<CaseListQuery>,
) -> Result<impl IntoResponse, FundError>
where
    C: CaseRepository + 'static,
    M: MemberRepository + 'static,
    T: ContributionRepository + 'static,
    S: DocumentStore + 'static,
    N: Notifier + 'static,
{
    let filter = CaseFilter {
        status: query.status,
        case_type: query.case_type,
        urgency: query.urgency,
        filed_by: None,
    };
    let page = service.list(
        &principal,
        filter,
        PageRequest::new(query.skip, query.limit),
    )?;
    Ok(Json(page.map(|record| record.status_view())))
}

async fn get_handler<C, M, T, S, N>(
    State(service): State<Arc<CaseService<C, M, T, S, N>>>,
    principal: Principal,
    Path(case_id): Path<String>,
) -> Result<impl IntoResponse, FundError>
where
    C: CaseRepository + 'static,
    M: MemberRepository + 'static,
    T: ContributionRepository + 'static,
    S: DocumentStore + 'static,
    N: Notifier + 'static,
{
    let case = service.get(&principal, &CaseId(case_id))?;
    Ok(Json(case))
}

async fn update_handler<C, M, T, S, N>(
    State(service): State<Arc<CaseService<C, M, T, S, N>>>,
    principal: Principal,
    Path(case_id): Path<String>,
    Json(patch): Json<CasePatch>,
) -> Result<impl IntoResponse, FundError>
where
    C: CaseRepository + 'static,
    M: MemberRepository + 'static,
    T: ContributionRepository + 'static,
    S: DocumentStore + 'static,
    N: Notifier + 'static,
{
    let case = service.update(&principal, &CaseId(case_id), patch)?;
    Ok(Json(case))
}

async fn delete_handler<C, M, T, S, N>(
    State(service): State<Arc<CaseService<C, M, T, S, N>>>,
    principal: Principal,
    Path(case_id): Path<String>,
) -> Result<impl IntoResponse, FundError>
where
    C: CaseRepository + 'static,
    M: MemberRepository + 'static,
    T: ContributionRepository + 'static,
    S: DocumentStore + 'static,
    N: Notifier + 'static,
{
    service.delete(&principal, &CaseId(case_id))?;
    Ok(StatusCode::NO_CONTENT)
}

async fn status_handler<C, M, T, S, N>(
    State(service): State<Arc<CaseService<C, M, T, S, N>>>,
    principal: Principal,
    Path(case_id): Path<String>,
    Json(request): Json<StatusTransitionRequest>,
) -> Result<impl IntoResponse, FundError>
where
    C: CaseRepository + 'static,
    M: MemberRepository + 'static,
    T: ContributionRepository + 'static,
    S: DocumentStore + 'static,
    N: Notifier + 'static,
{
    let today = request.today.unwrap_or_else(|| Local::now().date_naive());
    let case = service.transition_status(
        &principal,
        &CaseId(case_id),
        request.status,
        request.notes,
        today,
    )?;
    Ok(Json(case))
}

async fn confirm_receipt_handler<C, M, T, S, N>(
    State(service): State<Arc<CaseService<C, M, T, S, N>>>,
    principal: Principal,
    Path(case_id): Path<String>,
) -> Result<impl IntoResponse, FundError>
where
    C: CaseRepository + 'static,
    M: MemberRepository + 'static,
    T: ContributionRepository + 'static,
    S: DocumentStore + 'static,
    N: Notifier + 'static,
{
    let today = Local::now().date_naive();
    let case = service.confirm_receipt(&principal, &CaseId(case_id), today)?;
    Ok(Json(case))
}

async fn attach_document_handler<C, M, T, S, N>(
    State(service): State<Arc<CaseService<C, M, T, S, N>>>,
    principal: Principal,
    Path(case_id): Path<String>,
    Query(query): Query<DocumentQuery>,
    bytes: Bytes,
) -> Result<impl IntoResponse, FundError>
where
    C: CaseRepository + 'static,
    M: MemberRepository + 'static,
    T: ContributionRepository + 'static,
    S: DocumentStore + 'static,
    N: Notifier + 'static,
{
    let today = Local::now().date_naive();
    let case = service.attach_document(&principal, &CaseId(case_id), &query.name, &bytes, today)?;
    Ok((StatusCode::CREATED, Json(case)))
}

async fn remove_document_handler<C, M, T, S, N>(
    State(service): State<Arc<CaseService<C, M, T, S, N>>>,
    principal: Principal,
    Path((case_id, document_id)): Path<(String, Uuid)>,
) -> Result<impl IntoResponse, FundError>
where
    C: CaseRepository + 'static,
    M: MemberRepository + 'static,
    T: ContributionRepository + 'static,
    S: DocumentStore + 'static,
    N: Notifier + 'static,
{
    let case = service.remove_document(&principal, &CaseId(case_id), document_id)?;
    Ok(Json(case))
}
