//! Trusted identity supplied by the authenticating proxy.
//!
//! Authentication itself is an external collaborator: by the time a request
//! reaches these routers, the fronting layer has already verified the caller
//! and installed `x-principal-id` / `x-principal-role` headers. The core
//! trusts that input.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Opaque identifier of an authenticated account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrincipalId(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Member,
    Admin,
}

/// Caller identity attached to every core operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: PrincipalId,
    pub role: Role,
}

impl Principal {
    pub fn member(id: impl Into<String>) -> Self {
        Self {
            id: PrincipalId(id.into()),
            role: Role::Member,
        }
    }

    pub fn admin(id: impl Into<String>) -> Self {
        Self {
            id: PrincipalId(id.into()),
            role: Role::Admin,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

pub const PRINCIPAL_ID_HEADER: &str = "x-principal-id";
pub const PRINCIPAL_ROLE_HEADER: &str = "x-principal-role";

#[derive(Debug)]
pub enum AuthRejection {
    MissingIdentity,
    UnknownRole(String),
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let message = match self {
            AuthRejection::MissingIdentity => "request carries no authenticated identity".to_string(),
            AuthRejection::UnknownRole(role) => format!("unknown principal role '{role}'"),
        };
        let body = Json(json!({ "error": message }));
        (StatusCode::UNAUTHORIZED, body).into_response()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get(PRINCIPAL_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.trim().is_empty())
            .ok_or(AuthRejection::MissingIdentity)?;

        let role = parts
            .headers
            .get(PRINCIPAL_ROLE_HEADER)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("member");

        let role = match role.trim().to_ascii_lowercase().as_str() {
            "admin" => Role::Admin,
            "member" => Role::Member,
            other => return Err(AuthRejection::UnknownRole(other.to_string())),
        };

        Ok(Principal {
            id: PrincipalId(id.to_string()),
            role,
        })
    }
}
