use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::handlers::{participant, round};
use crate::state::AppState;

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/rounds", round_routes())
        .nest("/participants", participant_routes())
        .nest(
            "/leaderboard",
            OpenApiRouter::new().routes(routes!(participant::leaderboard)),
        )
}

fn round_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(round::list_rounds, round::create_round))
        .routes(routes!(round::active_round))
        .routes(routes!(
            round::get_round,
            round::update_round,
            round::delete_round
        ))
        .routes(routes!(round::close_round))
        .routes(routes!(round::cast_vote))
        .routes(routes!(round::submit))
        .routes(routes!(round::candidate_aggregate))
}

fn participant_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            participant::list_participants,
            participant::create_participant
        ))
        .routes(routes!(participant::me))
        .routes(routes!(participant::stats))
        .routes(routes!(participant::bulk_delete))
        .routes(routes!(participant::delete_participant))
}
