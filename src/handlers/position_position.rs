//! Reporting line handlers (position reports to position within a department)

use axum::{extract::Path, response::Json, Extension};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::Deserialize;

use super::{find_department, find_position};
use crate::entity::position_position;
use crate::error::{AppError, AppResult, OptionExt};
use crate::hierarchy::reparent::is_subordinate;
use crate::middleware::DbConn;
use crate::routes::ApiResponse;

#[derive(Debug, Deserialize)]
pub struct ReportingLineRequest {
    pub position_id: i64,
    pub parent_position_id: i64,
    pub department_id: i64,
    #[serde(default)]
    pub sort: i32,
}

/// GET /api/positionpositions
pub async fn list_lines(
    Extension(db): Extension<DbConn>,
) -> AppResult<Json<ApiResponse<Vec<position_position::Model>>>> {
    let lines = position_position::Entity::find()
        .filter(position_position::Column::Deleted.eq(false))
        .order_by_asc(position_position::Column::Id)
        .all(&*db)
        .await?;
    Ok(Json(ApiResponse::success(lines)))
}

/// POST /api/positionpositions
///
/// A position reports to at most one position per department. Use
/// `/api/tree/move` to change an existing line.
pub async fn create_line(
    Extension(db): Extension<DbConn>,
    Json(req): Json<ReportingLineRequest>,
) -> AppResult<Json<ApiResponse<position_position::Model>>> {
    if req.position_id == req.parent_position_id {
        return Err(AppError::Validation(
            "a position cannot report to itself".to_string(),
        ));
    }
    find_position(&db, req.position_id).await?;
    find_position(&db, req.parent_position_id).await?;
    find_department(&db, req.department_id).await?;

    let lines = position_position::Entity::find()
        .filter(position_position::Column::DepartmentId.eq(req.department_id))
        .filter(position_position::Column::Deleted.eq(false))
        .all(&*db)
        .await?;

    if lines.iter().any(|l| l.position_id == req.position_id) {
        return Err(AppError::Conflict(format!(
            "position {} already reports to a position in department {}",
            req.position_id, req.department_id
        )));
    }
    if is_subordinate(&lines, req.department_id, req.position_id, req.parent_position_id) {
        return Err(AppError::Validation(format!(
            "position {} reports to position {}; the line would create a cycle",
            req.parent_position_id, req.position_id
        )));
    }

    let line = position_position::ActiveModel {
        position_id: Set(req.position_id),
        parent_position_id: Set(req.parent_position_id),
        department_id: Set(req.department_id),
        sort: Set(req.sort),
        deleted: Set(false),
        ..Default::default()
    }
    .insert(&*db)
    .await?;

    tracing::info!(
        "Position {} now reports to {} in department {}",
        line.position_id,
        line.parent_position_id,
        line.department_id
    );
    Ok(Json(ApiResponse::success(line)))
}

/// DELETE /api/positionpositions/:id
pub async fn delete_line(
    Extension(db): Extension<DbConn>,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<()>>> {
    let line = position_position::Entity::find_by_id(id)
        .one(&*db)
        .await?
        .filter(|l| !l.deleted)
        .ok_or_not_found(format!("reporting line {} not found", id))?;

    let mut active: position_position::ActiveModel = line.into();
    active.deleted = Set(true);
    active.update(&*db).await?;
    tracing::info!("Retired reporting line {}", id);
    Ok(Json(ApiResponse::success_msg("success")))
}
