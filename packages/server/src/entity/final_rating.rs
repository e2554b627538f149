use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Stars and points resolved for a participant when the round closed.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "final_rating")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub round_id: i32,
    #[sea_orm(primary_key, auto_increment = false)]
    pub participant_id: i32,
    #[sea_orm(belongs_to, from = "round_id", to = "id")]
    pub round: HasOne<super::round::Entity>,

    pub stars: i32,
    pub points: i32,
}

impl ActiveModelBehavior for ActiveModel {}
