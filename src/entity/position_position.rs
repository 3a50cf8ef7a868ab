//! PositionPosition entity - "position reports to position within department"
//!
//! Table: hr_position_position

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "hr_position_position")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Subordinate position
    pub position_id: i64,

    /// Superior position
    pub parent_position_id: i64,

    /// Department the reporting line applies to
    pub department_id: i64,

    #[serde(default)]
    pub sort: i32,

    #[serde(default)]
    pub deleted: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
