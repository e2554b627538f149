use sea_orm::sea_query::{Index, PostgresQueryBuilder};
use sea_orm::*;
use tracing::info;

use crate::entity::{peer_vote, round};

/// Ensure required database indexes exist.
///
/// SeaORM's schema-sync doesn't support composite non-unique indexes,
/// so we create them manually on startup.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    // Per-candidate aggregation:
    // SELECT rating FROM peer_vote WHERE round_id = ? AND candidate_id = ?
    let stmt = Index::create()
        .if_not_exists()
        .name("idx_peer_vote_round_candidate")
        .table(peer_vote::Entity)
        .col(peer_vote::Column::RoundId)
        .col(peer_vote::Column::CandidateId)
        .to_string(PostgresQueryBuilder);

    match db.execute_unprepared(&stmt).await {
        Ok(_) => info!("Ensured index idx_peer_vote_round_candidate exists"),
        Err(e) => tracing::warn!("Failed to create index idx_peer_vote_round_candidate: {}", e),
    }

    // Latest decided round: WHERE status = ? ORDER BY end_date DESC
    let stmt = Index::create()
        .if_not_exists()
        .name("idx_round_status_end")
        .table(round::Entity)
        .col(round::Column::Status)
        .col(round::Column::EndDate)
        .to_string(PostgresQueryBuilder);

    match db.execute_unprepared(&stmt).await {
        Ok(_) => info!("Ensured index idx_round_status_end exists"),
        Err(e) => tracing::warn!("Failed to create index idx_round_status_end: {}", e),
    }

    Ok(())
}
