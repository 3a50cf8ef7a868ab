//! Department handlers
//!
//! Implements department CRUD operations

use axum::{extract::Path, response::Json, Extension};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::Deserialize;

use super::{find_department, find_position, require_name};
use crate::entity::{department, position_department};
use crate::error::{AppError, AppResult};
use crate::hierarchy::reparent::dependent_departments;
use crate::hierarchy::{plan_department_move, DepartmentTarget, MoveDepartment};
use crate::middleware::DbConn;
use crate::routes::ApiResponse;
use crate::source::load_tables;

const MAX_NAME_CHARS: usize = 128;

/// Create / update department request
#[derive(Debug, Deserialize)]
pub struct DepartmentRequest {
    pub name: String,
    #[serde(default)]
    pub parent_department_id: Option<i64>,
    #[serde(default)]
    pub parent_position_id: Option<i64>,
    #[serde(default)]
    pub is_organization: bool,
    #[serde(default)]
    pub logo_path: Option<String>,
}

impl DepartmentRequest {
    fn target(&self) -> AppResult<DepartmentTarget> {
        match (self.parent_department_id, self.parent_position_id) {
            (Some(_), Some(_)) => Err(AppError::Validation(
                "a department has either a parent department or a parent position, not both"
                    .to_string(),
            )),
            (Some(id), None) => Ok(DepartmentTarget::Department(id)),
            (None, Some(id)) => Ok(DepartmentTarget::Position(id)),
            (None, None) => Ok(DepartmentTarget::Root),
        }
    }
}

/// GET /api/departments
pub async fn list_departments(
    Extension(db): Extension<DbConn>,
) -> AppResult<Json<ApiResponse<Vec<department::Model>>>> {
    let departments = department::Entity::find()
        .filter(department::Column::Deleted.eq(false))
        .order_by_asc(department::Column::DepartmentId)
        .all(&*db)
        .await?;
    Ok(Json(ApiResponse::success(departments)))
}

/// POST /api/departments
pub async fn create_department(
    Extension(db): Extension<DbConn>,
    Json(req): Json<DepartmentRequest>,
) -> AppResult<Json<ApiResponse<department::Model>>> {
    let name = require_name("department name", &req.name, MAX_NAME_CHARS)?;
    match req.target()? {
        DepartmentTarget::Department(id) => {
            find_department(&db, id).await?;
        }
        DepartmentTarget::Position(id) => {
            find_position(&db, id).await?;
        }
        DepartmentTarget::Root => {}
    }

    let dept = department::ActiveModel {
        name: Set(name),
        parent_department_id: Set(req.parent_department_id),
        parent_position_id: Set(req.parent_position_id),
        is_organization: Set(req.is_organization),
        logo_path: Set(req.logo_path),
        deleted: Set(false),
        ..Default::default()
    }
    .insert(&*db)
    .await?;

    tracing::info!("Created department {} ({})", dept.department_id, dept.name);
    Ok(Json(ApiResponse::success(dept)))
}

/// PUT /api/departments/:id
pub async fn update_department(
    Extension(db): Extension<DbConn>,
    Path(id): Path<i64>,
    Json(req): Json<DepartmentRequest>,
) -> AppResult<Json<ApiResponse<department::Model>>> {
    let name = require_name("department name", &req.name, MAX_NAME_CHARS)?;
    let target = req.target()?;
    let current = find_department(&db, id).await?;

    let parent_changed = current.parent_department_id != req.parent_department_id
        || current.parent_position_id != req.parent_position_id;
    if parent_changed {
        // Re-parenting goes through the move planner for the cycle checks
        let tables = load_tables(&*db).await?;
        plan_department_move(
            &tables,
            &MoveDepartment {
                department_id: id,
                target,
            },
        )?;
    }

    let mut active: department::ActiveModel = current.into();
    active.name = Set(name);
    active.parent_department_id = Set(req.parent_department_id);
    active.parent_position_id = Set(req.parent_position_id);
    active.is_organization = Set(req.is_organization);
    active.logo_path = Set(req.logo_path);
    let dept = active.update(&*db).await?;

    tracing::info!("Updated department {} ({})", dept.department_id, dept.name);
    Ok(Json(ApiResponse::success(dept)))
}

/// DELETE /api/departments/:id
///
/// Soft delete. Refused while other departments depend on it, either as
/// sub-departments or hanging off positions that only appear here; the
/// department's staffing links are retired with it.
pub async fn delete_department(
    Extension(db): Extension<DbConn>,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<()>>> {
    let current = find_department(&db, id).await?;

    let tables = load_tables(&*db).await?;
    let dependents = dependent_departments(&tables, id);
    if !dependents.is_empty() {
        return Err(AppError::Conflict(format!(
            "departments {:?} still depend on department {}",
            dependents, id
        )));
    }

    let txn = db.begin().await?;
    position_department::Entity::update_many()
        .col_expr(position_department::Column::Deleted, Expr::value(true))
        .filter(position_department::Column::DepartmentId.eq(id))
        .exec(&txn)
        .await?;
    let mut active: department::ActiveModel = current.into();
    active.deleted = Set(true);
    active.update(&txn).await?;
    txn.commit().await?;

    tracing::info!("Deleted department {}", id);
    Ok(Json(ApiResponse::success_msg("success")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(parent_department_id: Option<i64>, parent_position_id: Option<i64>) -> DepartmentRequest {
        DepartmentRequest {
            name: "Sales".to_string(),
            parent_department_id,
            parent_position_id,
            is_organization: false,
            logo_path: None,
        }
    }

    #[test]
    fn test_single_parent_rule() {
        assert!(matches!(request(Some(1), Some(2)).target(), Err(AppError::Validation(_))));
        assert_eq!(request(Some(1), None).target().unwrap(), DepartmentTarget::Department(1));
        assert_eq!(request(None, Some(2)).target().unwrap(), DepartmentTarget::Position(2));
        assert_eq!(request(None, None).target().unwrap(), DepartmentTarget::Root);
    }

    #[test]
    fn test_request_defaults() {
        let req: DepartmentRequest = serde_json::from_str(r#"{"name":"Ops"}"#).unwrap();
        assert!(!req.is_organization);
        assert!(req.parent_department_id.is_none());
    }
}
