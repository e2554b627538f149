use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::permission;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::round::*;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/active",
    tag = "Rounds",
    operation_id = "getActiveRound",
    summary = "Get the active round",
    description = "Returns the active round (if any) together with the most recent closed round that produced a winner.",
    responses(
        (status = 200, description = "Active round view", body = ActiveRoundResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user))]
pub async fn active_round(
    _auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<ActiveRoundResponse>, AppError> {
    let view = state.rounds.active_view().await?;
    Ok(Json(view.into()))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Rounds",
    operation_id = "listRounds",
    summary = "List all rounds",
    description = "Returns every round, newest start date first, with the winner's name resolved. Requires `round:manage` permission.",
    responses(
        (status = 200, description = "All rounds", body = Vec<RoundSummaryResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn list_rounds(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<RoundSummaryResponse>>, AppError> {
    let rounds = state.rounds.list_rounds(&auth_user.actor()).await?;
    Ok(Json(rounds.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Rounds",
    operation_id = "createRound",
    summary = "Open a new round",
    description = "Creates a round in the `active` state. Fails with CONFLICT while another round is active. Requires `round:manage` permission.",
    request_body = CreateRoundRequest,
    responses(
        (status = 201, description = "Round created", body = RoundResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR, INVALID_RANGE)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 409, description = "Another round is active (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(creator = auth_user.participant_id))]
pub async fn create_round(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateRoundRequest>,
) -> Result<impl IntoResponse, AppError> {
    let round = state
        .rounds
        .create_round(&auth_user.actor(), payload.into())
        .await?;
    Ok((StatusCode::CREATED, Json(RoundResponse::from(round))))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Rounds",
    operation_id = "getRound",
    summary = "Get a round by ID",
    description = "Returns the round with its votes, submissions and final ratings.",
    params(("id" = i32, Path, description = "Round ID")),
    responses(
        (status = 200, description = "Round details", body = RoundDetailResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Round not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user))]
pub async fn get_round(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<RoundDetailResponse>, AppError> {
    let detail = state.rounds.get_round(id).await?;
    Ok(Json(detail.into()))
}

#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Rounds",
    operation_id = "updateRound",
    summary = "Edit a round",
    description = "Updates title, description or dates. Blank strings and absent fields are left unchanged. Requires `round:manage` permission.",
    params(("id" = i32, Path, description = "Round ID")),
    request_body = UpdateRoundRequest,
    responses(
        (status = 200, description = "Round updated", body = RoundResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Round not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload))]
pub async fn update_round(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateRoundRequest>,
) -> Result<Json<RoundResponse>, AppError> {
    let round = state
        .rounds
        .update_round(&auth_user.actor(), id, payload.into())
        .await?;
    Ok(Json(round.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Rounds",
    operation_id = "deleteRound",
    summary = "Delete a round",
    description = "Removes a round with its votes, submissions and ratings. Points already credited to participants are kept. Requires `round:manage` permission.",
    params(("id" = i32, Path, description = "Round ID")),
    responses(
        (status = 204, description = "Round deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Round not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn delete_round(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    state.rounds.delete_round(&auth_user.actor(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/{id}/close",
    tag = "Rounds",
    operation_id = "closeRound",
    summary = "Close a round and score it",
    description = "Resolves every participant's stars from peer votes and the supplied manual ratings, updates the participant ledgers, records the winner and freezes the round. Requires `round:manage` permission.",
    params(("id" = i32, Path, description = "Round ID")),
    request_body = CloseRoundRequest,
    responses(
        (status = 200, description = "Round closed", body = RoundDetailResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Round not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Round already closed (INVALID_STATE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(manual = payload.ratings.len()))]
pub async fn close_round(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<CloseRoundRequest>,
) -> Result<Json<RoundDetailResponse>, AppError> {
    let detail = state
        .rounds
        .close_round(&auth_user.actor(), id, &payload.manual_ratings())
        .await?;
    Ok(Json(detail.into()))
}

#[utoipa::path(
    post,
    path = "/{id}/vote",
    tag = "Rounds",
    operation_id = "castVote",
    summary = "Vote for a candidate",
    description = "Records a 1-10 rating for another participant. A second vote for the same candidate replaces the first.",
    params(("id" = i32, Path, description = "Round ID")),
    request_body = CastVoteRequest,
    responses(
        (status = 204, description = "Vote recorded"),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Round or candidate not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Round is closed (INVALID_STATE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(voter = auth_user.participant_id, candidate = payload.candidate_id))]
pub async fn cast_vote(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<CastVoteRequest>,
) -> Result<StatusCode, AppError> {
    state
        .rounds
        .votes()
        .cast_vote(
            &auth_user.actor(),
            id,
            payload.candidate_id,
            payload.rating,
            payload.comment,
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/{id}/submit",
    tag = "Rounds",
    operation_id = "submitProject",
    summary = "Submit a project link",
    description = "Records or replaces the caller's submission URL for an active round.",
    params(("id" = i32, Path, description = "Round ID")),
    request_body = SubmitRequest,
    responses(
        (status = 200, description = "Submission recorded", body = SubmissionResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Round not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Round is closed (INVALID_STATE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(participant = auth_user.participant_id))]
pub async fn submit(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<SubmitRequest>,
) -> Result<Json<SubmissionResponse>, AppError> {
    let submission = state
        .rounds
        .record_submission(&auth_user.actor(), id, &payload.url)
        .await?;
    Ok(Json(submission.into()))
}

#[utoipa::path(
    get,
    path = "/{id}/candidates/{candidate_id}/aggregate",
    tag = "Rounds",
    operation_id = "candidateAggregate",
    summary = "Sum and count of a candidate's votes",
    description = "Returns the raw peer vote aggregate for one candidate. Requires `round:manage` permission.",
    params(
        ("id" = i32, Path, description = "Round ID"),
        ("candidate_id" = i32, Path, description = "Candidate participant ID"),
    ),
    responses(
        (status = 200, description = "Vote aggregate", body = AggregateResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Round not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn candidate_aggregate(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((id, candidate_id)): Path<(i32, i32)>,
) -> Result<Json<AggregateResponse>, AppError> {
    auth_user.actor().require_permission(permission::ROUND_MANAGE)?;
    let tally = state.rounds.votes().aggregate_for(id, candidate_id).await?;
    Ok(Json(tally.into()))
}
