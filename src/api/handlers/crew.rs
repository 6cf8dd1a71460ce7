use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::{fleet_error, member_of, ApiResult, Identity};
use crate::models::*;
use crate::services::FleetService;

pub async fn list_crew(
    State(service): State<FleetService>,
    Path(starship_id): Path<String>,
    identity: Identity,
) -> ApiResult<Json<Vec<Record<Crew>>>> {
    member_of(&service, &starship_id, &identity)?;
    service
        .list_crew(&starship_id)
        .map(Json)
        .map_err(fleet_error)
}

pub async fn get_crew_member(
    State(service): State<FleetService>,
    Path((starship_id, crew_id)): Path<(String, String)>,
    identity: Identity,
) -> ApiResult<Json<Record<Crew>>> {
    member_of(&service, &starship_id, &identity)?;
    service
        .get_crew_member(&starship_id, &crew_id)
        .map(Json)
        .map_err(fleet_error)
}

pub async fn recruit_crew(
    State(service): State<FleetService>,
    Path(starship_id): Path<String>,
    identity: Identity,
    Json(input): Json<RecruitCrewInput>,
) -> ApiResult<(StatusCode, Json<RecruitResult>)> {
    service
        .recruit_crew(&starship_id, identity.uid(), input)
        .map(|r| (StatusCode::CREATED, Json(r)))
        .map_err(fleet_error)
}

pub async fn update_crew_member(
    State(service): State<FleetService>,
    Path((starship_id, crew_id)): Path<(String, String)>,
    identity: Identity,
    Json(input): Json<UpdateCrewInput>,
) -> ApiResult<Json<Record<Crew>>> {
    service
        .update_crew_member(&starship_id, &crew_id, identity.uid(), input)
        .map(Json)
        .map_err(fleet_error)
}

pub async fn record_presence(
    State(service): State<FleetService>,
    Path(starship_id): Path<String>,
    identity: Identity,
) -> ApiResult<Json<Record<Crew>>> {
    service
        .record_presence(&starship_id, identity.uid())
        .map(Json)
        .map_err(fleet_error)
}

pub async fn refresh_registration_code(
    State(service): State<FleetService>,
    Path((starship_id, crew_id)): Path<(String, String)>,
    identity: Identity,
) -> ApiResult<Json<IssuedCode>> {
    service
        .refresh_registration_code(&starship_id, &crew_id, identity.uid())
        .map(Json)
        .map_err(fleet_error)
}
