//! Position handlers

use axum::{extract::Path, response::Json, Extension};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{find_position, require_name};
use crate::entity::{position, position_department, position_position};
use crate::error::AppResult;
use crate::middleware::DbConn;
use crate::routes::ApiResponse;

const MAX_NAME_CHARS: usize = 128;

#[derive(Debug, Deserialize)]
pub struct PositionRequest {
    pub name: String,
}

/// Position together with the departments it is staffed in
#[derive(Debug, Serialize)]
pub struct PositionWithDepartments {
    #[serde(flatten)]
    pub position: position::Model,
    pub departments: Vec<position_department::Model>,
}

/// GET /api/positions
pub async fn list_positions(
    Extension(db): Extension<DbConn>,
) -> AppResult<Json<ApiResponse<Vec<position::Model>>>> {
    let positions = position::Entity::find()
        .filter(position::Column::Deleted.eq(false))
        .order_by_asc(position::Column::PositionId)
        .all(&*db)
        .await?;
    Ok(Json(ApiResponse::success(positions)))
}

/// GET /api/positions/with-departments
pub async fn list_positions_with_departments(
    Extension(db): Extension<DbConn>,
) -> AppResult<Json<ApiResponse<Vec<PositionWithDepartments>>>> {
    let positions = position::Entity::find()
        .filter(position::Column::Deleted.eq(false))
        .order_by_asc(position::Column::PositionId)
        .all(&*db)
        .await?;
    let links = position_department::Entity::find()
        .filter(position_department::Column::Deleted.eq(false))
        .order_by_asc(position_department::Column::Sort)
        .order_by_asc(position_department::Column::DepartmentId)
        .all(&*db)
        .await?;

    let mut by_position: HashMap<i64, Vec<position_department::Model>> = HashMap::new();
    for link in links {
        by_position.entry(link.position_id).or_default().push(link);
    }

    let data = positions
        .into_iter()
        .map(|position| PositionWithDepartments {
            departments: by_position.remove(&position.position_id).unwrap_or_default(),
            position,
        })
        .collect();
    Ok(Json(ApiResponse::success(data)))
}

/// POST /api/positions
pub async fn create_position(
    Extension(db): Extension<DbConn>,
    Json(req): Json<PositionRequest>,
) -> AppResult<Json<ApiResponse<position::Model>>> {
    let name = require_name("position name", &req.name, MAX_NAME_CHARS)?;
    let position = position::ActiveModel {
        name: Set(name),
        deleted: Set(false),
        ..Default::default()
    }
    .insert(&*db)
    .await?;

    tracing::info!("Created position {} ({})", position.position_id, position.name);
    Ok(Json(ApiResponse::success(position)))
}

/// PUT /api/positions/:id
pub async fn update_position(
    Extension(db): Extension<DbConn>,
    Path(id): Path<i64>,
    Json(req): Json<PositionRequest>,
) -> AppResult<Json<ApiResponse<position::Model>>> {
    let name = require_name("position name", &req.name, MAX_NAME_CHARS)?;
    let mut active: position::ActiveModel = find_position(&db, id).await?.into();
    active.name = Set(name);
    let position = active.update(&*db).await?;
    Ok(Json(ApiResponse::success(position)))
}

/// DELETE /api/positions/:id
///
/// Soft delete; every staffing link and reporting line touching the position
/// is retired in the same transaction.
pub async fn delete_position(
    Extension(db): Extension<DbConn>,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<()>>> {
    let current = find_position(&db, id).await?;

    let txn = db.begin().await?;
    position_department::Entity::update_many()
        .col_expr(position_department::Column::Deleted, Expr::value(true))
        .filter(position_department::Column::PositionId.eq(id))
        .exec(&txn)
        .await?;
    position_position::Entity::update_many()
        .col_expr(position_position::Column::Deleted, Expr::value(true))
        .filter(
            Condition::any()
                .add(position_position::Column::PositionId.eq(id))
                .add(position_position::Column::ParentPositionId.eq(id)),
        )
        .exec(&txn)
        .await?;
    let mut active: position::ActiveModel = current.into();
    active.deleted = Set(true);
    active.update(&txn).await?;
    txn.commit().await?;

    tracing::info!("Deleted position {}", id);
    Ok(Json(ApiResponse::success_msg("success")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_departments_shape() {
        let item = PositionWithDepartments {
            position: position::Model {
                position_id: 3,
                name: "Analyst".to_string(),
                deleted: false,
            },
            departments: vec![],
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["position_id"], 3);
        assert_eq!(json["name"], "Analyst");
        assert!(json["departments"].as_array().unwrap().is_empty());
    }
}
