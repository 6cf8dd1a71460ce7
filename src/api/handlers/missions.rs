use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use super::{fleet_error, member_of, ApiResult, Identity};
use crate::models::*;
use crate::services::FleetService;

#[derive(Debug, Default, Deserialize)]
pub struct MissionQuery {
    #[serde(default)]
    pub view: MissionView,
}

#[derive(Debug, Deserialize)]
pub struct StatusInput {
    pub status: MissionStatus,
}

pub async fn list_missions(
    State(service): State<FleetService>,
    Path(starship_id): Path<String>,
    Query(query): Query<MissionQuery>,
    identity: Identity,
) -> ApiResult<Json<Vec<Record<Mission>>>> {
    member_of(&service, &starship_id, &identity)?;
    service
        .list_missions(&starship_id, identity.uid(), query.view)
        .map(Json)
        .map_err(fleet_error)
}

pub async fn get_mission(
    State(service): State<FleetService>,
    Path((starship_id, mission_id)): Path<(String, String)>,
    identity: Identity,
) -> ApiResult<Json<Record<Mission>>> {
    member_of(&service, &starship_id, &identity)?;
    service
        .get_mission(&starship_id, &mission_id)
        .map(Json)
        .map_err(fleet_error)
}

pub async fn add_mission(
    State(service): State<FleetService>,
    Path(starship_id): Path<String>,
    identity: Identity,
    Json(input): Json<CreateMissionInput>,
) -> ApiResult<(StatusCode, Json<Record<Mission>>)> {
    service
        .add_mission(&starship_id, identity.uid(), input)
        .map(|m| (StatusCode::CREATED, Json(m)))
        .map_err(fleet_error)
}

pub async fn update_mission(
    State(service): State<FleetService>,
    Path((starship_id, mission_id)): Path<(String, String)>,
    identity: Identity,
    Json(input): Json<UpdateMissionInput>,
) -> ApiResult<Json<Record<Mission>>> {
    service
        .update_mission(&starship_id, &mission_id, identity.uid(), input)
        .map(Json)
        .map_err(fleet_error)
}

pub async fn delete_mission(
    State(service): State<FleetService>,
    Path((starship_id, mission_id)): Path<(String, String)>,
    identity: Identity,
) -> ApiResult<StatusCode> {
    service
        .delete_mission(&starship_id, &mission_id, identity.uid())
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(fleet_error)
}

pub async fn claim_mission(
    State(service): State<FleetService>,
    Path((starship_id, mission_id)): Path<(String, String)>,
    identity: Identity,
) -> ApiResult<Json<Record<Mission>>> {
    service
        .claim_mission(&starship_id, &mission_id, identity.uid())
        .map(Json)
        .map_err(fleet_error)
}

pub async fn submit_mission(
    State(service): State<FleetService>,
    Path((starship_id, mission_id)): Path<(String, String)>,
    identity: Identity,
) -> ApiResult<Json<Record<Mission>>> {
    service
        .submit_mission(&starship_id, &mission_id, identity.uid())
        .map(Json)
        .map_err(fleet_error)
}

pub async fn approve_mission(
    State(service): State<FleetService>,
    Path((starship_id, mission_id)): Path<(String, String)>,
    identity: Identity,
) -> ApiResult<Json<Record<Mission>>> {
    service
        .approve_mission(&starship_id, &mission_id, identity.uid())
        .map(Json)
        .map_err(fleet_error)
}

/// Generic lifecycle endpoint: move to the given status if it is next.
pub async fn set_mission_status(
    State(service): State<FleetService>,
    Path((starship_id, mission_id)): Path<(String, String)>,
    identity: Identity,
    Json(input): Json<StatusInput>,
) -> ApiResult<Json<Record<Mission>>> {
    service
        .advance_mission(&starship_id, &mission_id, identity.uid(), input.status)
        .map(Json)
        .map_err(fleet_error)
}
