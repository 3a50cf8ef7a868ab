//! Department entity
//!
//! Table: hr_department

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "hr_department")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub department_id: i64,

    /// Department name
    #[sea_orm(column_type = "String(Some(128))")]
    pub name: String,

    /// Parent department (mutually exclusive with `parent_position_id`)
    pub parent_department_id: Option<i64>,

    /// Parent position (mutually exclusive with `parent_department_id`)
    pub parent_position_id: Option<i64>,

    /// Marks a top-level legal entity
    #[serde(default)]
    pub is_organization: bool,

    #[serde(default)]
    pub logo_path: Option<String>,

    /// Soft-delete flag
    #[serde(default)]
    pub deleted: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

// Parent links are resolved in memory by the hierarchy builder

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// No parent of either kind
    pub fn is_top_level(&self) -> bool {
        self.parent_department_id.is_none() && self.parent_position_id.is_none()
    }
}
