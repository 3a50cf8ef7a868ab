//! Position entity
//!
//! Table: hr_position. A position has no parent column; parentage lives in
//! `position_department` and `position_position`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "hr_position")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub position_id: i64,

    #[sea_orm(column_type = "String(Some(128))")]
    pub name: String,

    #[serde(default)]
    pub deleted: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
