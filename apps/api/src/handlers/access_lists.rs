use axum::Json;
use axum::extract::State;
use bfguard_domain::ReservedList;

use crate::dto::{StatusResponse, SubnetListResponse, SubnetRequest};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_allow_list_handler(
    State(state): State<AppState>,
) -> ApiResult<Json<SubnetListResponse>> {
    list_subnets(&state, ReservedList::Allow).await
}

pub async fn add_to_allow_list_handler(
    State(state): State<AppState>,
    Json(payload): Json<SubnetRequest>,
) -> ApiResult<Json<StatusResponse>> {
    add_subnet(&state, ReservedList::Allow, payload).await
}

pub async fn remove_from_allow_list_handler(
    State(state): State<AppState>,
    Json(payload): Json<SubnetRequest>,
) -> ApiResult<Json<StatusResponse>> {
    remove_subnet(&state, ReservedList::Allow, payload).await
}

pub async fn list_deny_list_handler(
    State(state): State<AppState>,
) -> ApiResult<Json<SubnetListResponse>> {
    list_subnets(&state, ReservedList::Deny).await
}

pub async fn add_to_deny_list_handler(
    State(state): State<AppState>,
    Json(payload): Json<SubnetRequest>,
) -> ApiResult<Json<StatusResponse>> {
    add_subnet(&state, ReservedList::Deny, payload).await
}

pub async fn remove_from_deny_list_handler(
    State(state): State<AppState>,
    Json(payload): Json<SubnetRequest>,
) -> ApiResult<Json<StatusResponse>> {
    remove_subnet(&state, ReservedList::Deny, payload).await
}

async fn list_subnets(state: &AppState, list: ReservedList) -> ApiResult<Json<SubnetListResponse>> {
    let subnets = state.access_list_service.list_subnets(list).await?;
    Ok(Json(SubnetListResponse::from(subnets)))
}

async fn add_subnet(
    state: &AppState,
    list: ReservedList,
    payload: SubnetRequest,
) -> ApiResult<Json<StatusResponse>> {
    let report = state
        .access_list_service
        .add_to_list(list, payload.cidr.as_str())
        .await?;
    Ok(Json(StatusResponse::from(report)))
}

async fn remove_subnet(
    state: &AppState,
    list: ReservedList,
    payload: SubnetRequest,
) -> ApiResult<Json<StatusResponse>> {
    let report = state
        .access_list_service
        .remove_from_list(list, payload.cidr.as_str())
        .await?;
    Ok(Json(StatusResponse::from(report)))
}
