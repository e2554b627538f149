use common::RoundStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "round")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub start_date: DateTimeUtc,
    pub end_date: DateTimeUtc,
    pub status: RoundStatus,
    /// `Some(true)` while active and NULL once closed. The unique index
    /// admits a single active row.
    #[sea_orm(unique)]
    pub active_slot: Option<bool>,

    pub created_by: i32,
    pub winner_id: Option<i32>,
    pub winner_points: i32,
    pub closed_at: Option<DateTimeUtc>,

    #[sea_orm(has_many)]
    pub votes: HasMany<super::peer_vote::Entity>,

    #[sea_orm(has_many)]
    pub submissions: HasMany<super::submission::Entity>,

    #[sea_orm(has_many)]
    pub ratings: HasMany<super::final_rating::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
