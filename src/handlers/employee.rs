//! Employee handlers

use axum::{extract::Path, response::Json, Extension};
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait};
use serde::Deserialize;

use super::{find_department, find_position, require_name};
use crate::entity::employee;
use crate::error::{AppError, AppResult, OptionExt};
use crate::middleware::DbConn;
use crate::routes::ApiResponse;

const MAX_NAME_CHARS: usize = 256;

#[derive(Debug, Deserialize)]
pub struct EmployeeRequest {
    pub full_name: String,
    #[serde(default)]
    pub position_id: Option<i64>,
    #[serde(default)]
    pub department_id: Option<i64>,
    #[serde(default)]
    pub manager_id: Option<i64>,
}

/// Check that every referenced row exists
async fn validate_refs(db: &DbConn, req: &EmployeeRequest, employee_id: Option<i64>) -> AppResult<()> {
    if let Some(id) = req.position_id {
        find_position(db, id).await?;
    }
    if let Some(id) = req.department_id {
        find_department(db, id).await?;
    }
    if let Some(manager_id) = req.manager_id {
        if Some(manager_id) == employee_id {
            return Err(AppError::Validation("an employee cannot manage themselves".to_string()));
        }
        employee::Entity::find_by_id(manager_id)
            .one(&**db)
            .await?
            .ok_or_not_found(format!("employee {} not found", manager_id))?;
    }
    Ok(())
}

/// GET /api/employees
pub async fn list_employees(
    Extension(db): Extension<DbConn>,
) -> AppResult<Json<ApiResponse<Vec<employee::Model>>>> {
    let employees = employee::Entity::find()
        .order_by_asc(employee::Column::EmployeeId)
        .all(&*db)
        .await?;
    Ok(Json(ApiResponse::success(employees)))
}

/// POST /api/employees
pub async fn create_employee(
    Extension(db): Extension<DbConn>,
    Json(req): Json<EmployeeRequest>,
) -> AppResult<Json<ApiResponse<employee::Model>>> {
    let full_name = require_name("full name", &req.full_name, MAX_NAME_CHARS)?;
    validate_refs(&db, &req, None).await?;

    let emp = employee::ActiveModel {
        full_name: Set(full_name),
        position_id: Set(req.position_id),
        department_id: Set(req.department_id),
        manager_id: Set(req.manager_id),
        ..Default::default()
    }
    .insert(&*db)
    .await?;

    tracing::info!("Created employee {}", emp.employee_id);
    Ok(Json(ApiResponse::success(emp)))
}

/// PUT /api/employees/:id
pub async fn update_employee(
    Extension(db): Extension<DbConn>,
    Path(id): Path<i64>,
    Json(req): Json<EmployeeRequest>,
) -> AppResult<Json<ApiResponse<employee::Model>>> {
    let full_name = require_name("full name", &req.full_name, MAX_NAME_CHARS)?;
    let current = employee::Entity::find_by_id(id)
        .one(&*db)
        .await?
        .ok_or_not_found(format!("employee {} not found", id))?;
    validate_refs(&db, &req, Some(id)).await?;

    let mut active: employee::ActiveModel = current.into();
    active.full_name = Set(full_name);
    active.position_id = Set(req.position_id);
    active.department_id = Set(req.department_id);
    active.manager_id = Set(req.manager_id);
    let emp = active.update(&*db).await?;
    Ok(Json(ApiResponse::success(emp)))
}

/// DELETE /api/employees/:id
///
/// Employees are removed outright; direct reports lose their manager.
pub async fn delete_employee(
    Extension(db): Extension<DbConn>,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<()>>> {
    let txn = db.begin().await?;
    employee::Entity::update_many()
        .col_expr(employee::Column::ManagerId, Expr::value(Option::<i64>::None))
        .filter(employee::Column::ManagerId.eq(id))
        .exec(&txn)
        .await?;
    let result = employee::Entity::delete_by_id(id).exec(&txn).await?;
    if result.rows_affected == 0 {
        txn.rollback().await?;
        return Err(AppError::NotFound(format!("employee {} not found", id)));
    }
    txn.commit().await?;

    tracing::info!("Deleted employee {}", id);
    Ok(Json(ApiResponse::success_msg("success")))
}
