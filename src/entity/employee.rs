//! Employee entity
//!
//! Table: hr_employee

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "hr_employee")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub employee_id: i64,

    #[sea_orm(column_type = "String(Some(256))")]
    pub full_name: String,

    pub position_id: Option<i64>,

    pub department_id: Option<i64>,

    pub manager_id: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// The (position, department) seat this employee occupies, if fully assigned
    pub fn seat(&self) -> Option<(i64, i64)> {
        Some((self.position_id?, self.department_id?))
    }
}
