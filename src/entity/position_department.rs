//! PositionDepartment entity - staffing of a position inside a department
//!
//! Table: hr_position_department

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "hr_position_department")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub position_id: i64,

    pub department_id: i64,

    /// Budgeted head count
    #[serde(default)]
    pub staff_units: i32,

    /// Head count as last entered by HR (informational)
    #[serde(default)]
    pub current_count: i32,

    /// Open seats
    #[serde(default)]
    pub vacancies: i32,

    /// Display order among the department's positions
    #[serde(default)]
    pub sort: i32,

    #[serde(default)]
    pub deleted: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
