//! Table loader backed by sea-orm

use async_trait::async_trait;
use sea_orm::{ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder};

use super::OrgSource;
use crate::entity::{department, employee, position, position_department, position_position};
use crate::error::AppResult;
use crate::hierarchy::OrgTables;

pub struct DatabaseSource {
    db: DatabaseConnection,
}

impl DatabaseSource {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl OrgSource for DatabaseSource {
    async fn load(&self) -> AppResult<OrgTables> {
        Ok(load_tables(&self.db).await?)
    }
}

/// Load every active row through any connection or transaction. The five
/// queries run concurrently.
pub async fn load_tables<C: ConnectionTrait>(db: &C) -> Result<OrgTables, DbErr> {
    let (departments, positions, position_departments, position_positions, employees) = futures::try_join!(
        department::Entity::find()
            .filter(department::Column::Deleted.eq(false))
            .order_by_asc(department::Column::DepartmentId)
            .all(db),
        position::Entity::find()
            .filter(position::Column::Deleted.eq(false))
            .order_by_asc(position::Column::PositionId)
            .all(db),
        position_department::Entity::find()
            .filter(position_department::Column::Deleted.eq(false))
            .order_by_asc(position_department::Column::Id)
            .all(db),
        position_position::Entity::find()
            .filter(position_position::Column::Deleted.eq(false))
            .order_by_asc(position_position::Column::Id)
            .all(db),
        employee::Entity::find()
            .order_by_asc(employee::Column::EmployeeId)
            .all(db),
    )?;

    tracing::debug!(
        "Loaded org tables: {} departments, {} positions, {} staffing links, {} reporting lines, {} employees",
        departments.len(),
        positions.len(),
        position_departments.len(),
        position_positions.len(),
        employees.len()
    );

    Ok(OrgTables {
        departments,
        positions,
        position_departments,
        position_positions,
        employees,
    })
}
