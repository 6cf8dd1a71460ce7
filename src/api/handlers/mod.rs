mod crew;
mod missions;
mod modules;
mod streams;

pub use crew::*;
pub use missions::*;
pub use modules::*;
pub use streams::*;

use std::convert::Infallible;

use axum::{
    extract::{FromRequestParts, Path, State},
    http::{request::Parts, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::error::FleetError;
use crate::models::*;
use crate::services::directory::Discovery;
use crate::services::FleetService;

/// Header carrying the caller's authenticated user id.
pub const UID_HEADER: &str = "X-Starship-Uid";

pub type ApiResult<T> = Result<T, (StatusCode, String)>;

// ============================================================
// Error Handling
// ============================================================

/// Map a service error to a status and a user-facing message.
///
/// Store failures are logged in full and sanitized for the client.
pub(crate) fn fleet_error(e: FleetError) -> (StatusCode, String) {
    let status = match &e {
        FleetError::Validation(_) | FleetError::InvalidCode => StatusCode::BAD_REQUEST,
        FleetError::NotFound(_) => StatusCode::NOT_FOUND,
        FleetError::AlreadyExists(_)
        | FleetError::InvalidTransition { .. }
        | FleetError::Conflict(_) => StatusCode::CONFLICT,
        FleetError::CodeExpired => StatusCode::GONE,
        FleetError::AuthenticationRequired => StatusCode::UNAUTHORIZED,
        FleetError::Forbidden(_) => StatusCode::FORBIDDEN,
        FleetError::Store(_) => {
            tracing::error!("Internal error: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            );
        }
    };

    tracing::warn!(%status, "Request rejected: {}", e);
    (status, e.to_string())
}

// ============================================================
// Identity
// ============================================================

/// The caller's user id, taken from the [`UID_HEADER`] header.
///
/// Absence is not a rejection here; each operation decides whether it
/// needs a signed-in caller.
#[derive(Debug, Clone, Default)]
pub struct Identity(pub Option<String>);

impl Identity {
    pub fn uid(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let uid = parts
            .headers
            .get(UID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|uid| !uid.is_empty())
            .map(str::to_string);
        Ok(Identity(uid))
    }
}

/// Reads of a household are limited to its members.
pub(crate) fn member_of(
    service: &FleetService,
    starship_id: &str,
    identity: &Identity,
) -> ApiResult<()> {
    service
        .require_member(starship_id, identity.uid())
        .map(|_| ())
        .map_err(fleet_error)
}

// ============================================================
// Health & Auth
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

#[derive(Debug, Serialize)]
pub struct AnonymousSession {
    pub uid: String,
}

/// Issue a fresh anonymous user id, used by newcomers joining with a code.
pub async fn sign_in_anonymously() -> (StatusCode, Json<AnonymousSession>) {
    let uid = Uuid::new_v4().simple().to_string();
    tracing::info!(%uid, "Anonymous user signed in");
    (StatusCode::CREATED, Json(AnonymousSession { uid }))
}

// ============================================================
// Directory
// ============================================================

pub async fn discover_starship(
    State(service): State<FleetService>,
    identity: Identity,
) -> ApiResult<Json<Discovery>> {
    service
        .discover_starship(identity.uid())
        .map(Json)
        .map_err(fleet_error)
}

// ============================================================
// Starships
// ============================================================

pub async fn commission_starship(
    State(service): State<FleetService>,
    identity: Identity,
    Json(input): Json<CommissionStarshipInput>,
) -> ApiResult<(StatusCode, Json<Record<Starship>>)> {
    service
        .commission_starship(identity.uid(), input)
        .map(|s| (StatusCode::CREATED, Json(s)))
        .map_err(fleet_error)
}

pub async fn get_starship(
    State(service): State<FleetService>,
    Path(id): Path<String>,
    identity: Identity,
) -> ApiResult<Json<Record<Starship>>> {
    member_of(&service, &id, &identity)?;
    service.get_starship(&id).map(Json).map_err(fleet_error)
}

pub async fn update_starship(
    State(service): State<FleetService>,
    Path(id): Path<String>,
    identity: Identity,
    Json(input): Json<UpdateStarshipInput>,
) -> ApiResult<Json<Record<Starship>>> {
    service
        .update_starship(&id, identity.uid(), input)
        .map(Json)
        .map_err(fleet_error)
}

pub async fn set_hull_integrity(
    State(service): State<FleetService>,
    Path(id): Path<String>,
    identity: Identity,
    Json(input): Json<HullIntegrityInput>,
) -> ApiResult<Json<Record<Starship>>> {
    service
        .set_hull_integrity(&id, identity.uid(), input.hull_integrity)
        .map(Json)
        .map_err(fleet_error)
}

// ============================================================
// Joining
// ============================================================

/// Either the fields of a registration code or a scanned QR payload.
#[derive(Debug, serde::Deserialize)]
#[serde(untagged)]
pub enum JoinRequest {
    Qr { qr: String },
    Code(RedeemCodeInput),
}

pub async fn join_starship(
    State(service): State<FleetService>,
    identity: Identity,
    Json(request): Json<JoinRequest>,
) -> ApiResult<Json<JoinOutcome>> {
    let input = match request {
        JoinRequest::Code(input) => input,
        JoinRequest::Qr { qr } => QrPayload::parse(&qr)
            .map(RedeemCodeInput::from)
            .ok_or_else(|| fleet_error(FleetError::InvalidCode))?,
    };
    service
        .redeem_registration_code(identity.uid(), input)
        .map(Json)
        .map_err(fleet_error)
}
