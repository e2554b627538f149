use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::participant::*;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/",
    tag = "Participants",
    operation_id = "createParticipant",
    summary = "Register a participant",
    description = "Creates a participant with an empty ledger. E-mail addresses are unique and stored lowercase. Requires `participant:manage` permission.",
    request_body = CreateParticipantRequest,
    responses(
        (status = 201, description = "Participant created", body = ParticipantResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 409, description = "E-mail already registered (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload))]
pub async fn create_participant(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateParticipantRequest>,
) -> Result<impl IntoResponse, AppError> {
    let participant = state
        .participants
        .register(&auth_user.actor(), payload.into())
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ParticipantResponse::from(participant)),
    ))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Participants",
    operation_id = "listParticipants",
    summary = "List participants",
    description = "Returns every participant with role `participant`, sorted by name.",
    responses(
        (status = 200, description = "Participants", body = Vec<ParticipantResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user))]
pub async fn list_participants(
    _auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<ParticipantResponse>>, AppError> {
    let participants = state.participants.list().await?;
    Ok(Json(participants.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/me",
    tag = "Participants",
    operation_id = "getOwnProfile",
    summary = "Get the caller's profile",
    responses(
        (status = 200, description = "Own profile and ledger", body = ParticipantResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Participant not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(participant = auth_user.participant_id))]
pub async fn me(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<ParticipantResponse>, AppError> {
    let participant = state.participants.profile(auth_user.participant_id).await?;
    Ok(Json(participant.into()))
}

#[utoipa::path(
    get,
    path = "/stats",
    tag = "Participants",
    operation_id = "getStats",
    summary = "Global counters",
    description = "Participant and round counts plus whether a round is active.",
    responses(
        (status = 200, description = "Stats", body = StatsResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user))]
pub async fn stats(
    _auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<StatsResponse>, AppError> {
    Ok(Json(state.participants.stats().await?.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Participants",
    operation_id = "deleteParticipant",
    summary = "Delete a participant",
    description = "Removes a participant. Votes and ratings in past rounds are kept. Requires `participant:manage` permission.",
    params(("id" = i32, Path, description = "Participant ID")),
    responses(
        (status = 204, description = "Participant deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Participant not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn delete_participant(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    state.participants.delete(&auth_user.actor(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/bulk-delete",
    tag = "Participants",
    operation_id = "bulkDeleteParticipants",
    summary = "Delete several participants",
    description = "Removes every listed participant that exists and reports how many were deleted. Requires `participant:manage` permission.",
    request_body = BulkDeleteRequest,
    responses(
        (status = 200, description = "Participants deleted", body = BulkDeleteResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(requested = payload.ids.len()))]
pub async fn bulk_delete(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<BulkDeleteRequest>,
) -> Result<Json<BulkDeleteResponse>, AppError> {
    let deleted = state
        .participants
        .bulk_delete(&auth_user.actor(), &payload.ids)
        .await?;
    Ok(Json(BulkDeleteResponse { deleted }))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Leaderboard",
    operation_id = "getLeaderboard",
    summary = "Ranked participants",
    description = "Participants ordered by total points, then streak, then name. Ranks are 1-based positions.",
    responses(
        (status = 200, description = "Leaderboard", body = Vec<LeaderboardEntryResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user))]
pub async fn leaderboard(
    _auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<LeaderboardEntryResponse>>, AppError> {
    let entries = state.participants.leaderboard().await?;
    Ok(Json(entries.into_iter().map(Into::into).collect()))
}
