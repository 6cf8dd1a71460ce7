use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::{fleet_error, member_of, ApiResult, Identity};
use crate::models::*;
use crate::services::FleetService;

pub async fn list_modules(
    State(service): State<FleetService>,
    Path(starship_id): Path<String>,
    identity: Identity,
) -> ApiResult<Json<Vec<Record<Module>>>> {
    member_of(&service, &starship_id, &identity)?;
    service
        .list_modules(&starship_id)
        .map(Json)
        .map_err(fleet_error)
}

pub async fn get_module(
    State(service): State<FleetService>,
    Path((starship_id, module_id)): Path<(String, String)>,
    identity: Identity,
) -> ApiResult<Json<Record<Module>>> {
    member_of(&service, &starship_id, &identity)?;
    service
        .get_module(&starship_id, &module_id)
        .map(Json)
        .map_err(fleet_error)
}

pub async fn add_module(
    State(service): State<FleetService>,
    Path(starship_id): Path<String>,
    identity: Identity,
    Json(input): Json<CreateModuleInput>,
) -> ApiResult<(StatusCode, Json<Record<Module>>)> {
    service
        .add_module(&starship_id, identity.uid(), input)
        .map(|m| (StatusCode::CREATED, Json(m)))
        .map_err(fleet_error)
}

pub async fn update_module(
    State(service): State<FleetService>,
    Path((starship_id, module_id)): Path<(String, String)>,
    identity: Identity,
    Json(input): Json<UpdateModuleInput>,
) -> ApiResult<Json<Record<Module>>> {
    service
        .update_module(&starship_id, &module_id, identity.uid(), input)
        .map(Json)
        .map_err(fleet_error)
}

pub async fn delete_module(
    State(service): State<FleetService>,
    Path((starship_id, module_id)): Path<(String, String)>,
    identity: Identity,
) -> ApiResult<StatusCode> {
    service
        .delete_module(&starship_id, &module_id, identity.uid())
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(fleet_error)
}
