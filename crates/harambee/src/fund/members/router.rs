use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use chrono::Local;
use serde::Deserialize;

use crate::fund::auth::Principal;
use crate::fund::error::FundError;
use crate::fund::notify::Notifier;
use crate::fund::repository::PageRequest;

use super::domain::{
    MemberFilter, MemberId, MemberStatus, ProfileSubmission, ProvisionMemberRequest,
};
use super::repository::MemberRepository;
use super::service::MemberService;

/// Router builder exposing the member registry endpoints.
pub fn member_router<R, N>(service: Arc<MemberService<R, N>>) -> Router
where
    R: MemberRepository + 'static,
    N: Notifier + 'static,
{
    Router::new()
        .route(
            "/api/v1/members",
            post(provision_handler::<R, N>).get(list_handler::<R, N>),
        )
        .route("/api/v1/members/me", get(own_profile_handler::<R, N>))
        .route("/api/v1/members/:member_id", get(get_handler::<R, N>))
        .route(
            "/api/v1/members/:member_id/profile",
            post(complete_profile_handler::<R, N>),
        )
        .route(
            "/api/v1/members/:member_id/status",
            patch(status_handler::<R, N>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct MemberListQuery {
    #[serde(default)]
    skip: usize,
    #[serde(default = "default_limit")]
    limit: usize,
    #[serde(default)]
    status: Option<MemberStatus>,
    #[serde(default)]
    search: Option<String>,
}

fn default_limit() -> usize {
    50
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusUpdateRequest {
    status: MemberStatus,
}

async fn provision_handler<R, N>(
    State(service): State<Arc<MemberService<R, N>>>,
    principal: Principal,
    Json(request): Json<ProvisionMemberRequest>,
) -> Result<impl IntoResponse, FundError>
where
    R: MemberRepository + 'static,
    N: Notifier + 'static,
{
    let today = Local::now().date_naive();
    let member = service.provision(&principal, request, today)?;
    Ok((StatusCode::CREATED, Json(member.status_view())))
}

async fn list_handler<R, N>(
    State(service): State<Arc<MemberService<R, N>>>,
    principal: Principal,
    Query(query): Query<MemberListQuery>,
) -> Result<impl IntoResponse, FundError>
where
    R: MemberRepository + 'static,
    N: Notifier + 'static,
{
    let filter = MemberFilter {
        status: query.status,
        search: query.search,
    };
    let page = service.list(
        &principal,
        &filter,
        PageRequest::new(query.skip, query.limit),
    )?;
    Ok(Json(page.map(|record| record.status_view())))
}

async fn own_profile_handler<R, N>(
    State(service): State<Arc<MemberService<R, N>>>,
    principal: Principal,
) -> Result<impl IntoResponse, FundError>
where
    R: MemberRepository + 'static,
    N: Notifier + 'static,
{
    let member = service.get_own(&principal)?;
    Ok(Json(member))
}

async fn get_handler<R, N>(
    State(service): State<Arc<MemberService<R, N>>>,
    principal: Principal,
    Path(member_id): Path<String>,
) -> Result<impl IntoResponse, FundError>
where
    R: MemberRepository + 'static,
    N: Notifier + 'static,
{
    let member = service.get(&principal, &MemberId(member_id))?;
    Ok(Json(member))
}

async fn complete_profile_handler<R, N>(
    State(service): State<Arc<MemberService<R, N>>>,
    principal: Principal,
    Path(member_id): Path<String>,
    Json(submission): Json<ProfileSubmission>,
) -> Result<impl IntoResponse, FundError>
where
    R: MemberRepository + 'static,
    N: Notifier + 'static,
{
    let today = Local::now().date_naive();
    let member = service.complete_profile(&principal, &MemberId(member_id), submission, today)?;
    Ok(Json(member))
}

async fn status_handler<R, N>(
    State(service): State<Arc<MemberService<R, N>>>,
    principal: Principal,
    Path(member_id): Path<String>,
    Json(request): Json<StatusUpdateRequest>,
) -> Result<impl IntoResponse, FundError>
where
    R: MemberRepository + 'static,
    N: Notifier + 'static,
{
    let member = service.set_status(&principal, &MemberId(member_id), request.status)?;
    Ok(Json(member.status_view()))
}
