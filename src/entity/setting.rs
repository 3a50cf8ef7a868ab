//! Setting entity - key/value application settings
//!
//! Table: hr_setting

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Key holding the number of hierarchy levels shown by default
pub const HIERARCHY_LEVELS: &str = "hierarchy_levels";

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "hr_setting")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_type = "String(Some(64))")]
    pub key: String,

    pub value: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
