//! Staffing link handlers (position staffed in department)

use axum::{extract::Path, response::Json, Extension};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::Deserialize;

use super::{find_department, find_position};
use crate::entity::position_department;
use crate::error::{AppError, AppResult, OptionExt};
use crate::middleware::DbConn;
use crate::routes::ApiResponse;

/// Staffing figures shared by create and update
#[derive(Debug, Default, Deserialize)]
pub struct StaffingFigures {
    #[serde(default)]
    pub staff_units: i32,
    #[serde(default)]
    pub current_count: i32,
    #[serde(default)]
    pub vacancies: i32,
    #[serde(default)]
    pub sort: i32,
}

impl StaffingFigures {
    fn validate(&self) -> AppResult<()> {
        if self.staff_units < 0 || self.current_count < 0 || self.vacancies < 0 {
            return Err(AppError::Validation(
                "staff_units, current_count and vacancies must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateStaffingRequest {
    pub position_id: i64,
    pub department_id: i64,
    #[serde(flatten)]
    pub figures: StaffingFigures,
}

/// GET /api/positiondepartments
pub async fn list_links(
    Extension(db): Extension<DbConn>,
) -> AppResult<Json<ApiResponse<Vec<position_department::Model>>>> {
    let links = position_department::Entity::find()
        .filter(position_department::Column::Deleted.eq(false))
        .order_by_asc(position_department::Column::Id)
        .all(&*db)
        .await?;
    Ok(Json(ApiResponse::success(links)))
}

/// POST /api/positiondepartments
pub async fn create_link(
    Extension(db): Extension<DbConn>,
    Json(req): Json<CreateStaffingRequest>,
) -> AppResult<Json<ApiResponse<position_department::Model>>> {
    req.figures.validate()?;
    find_position(&db, req.position_id).await?;
    find_department(&db, req.department_id).await?;

    let existing = position_department::Entity::find()
        .filter(position_department::Column::PositionId.eq(req.position_id))
        .filter(position_department::Column::DepartmentId.eq(req.department_id))
        .filter(position_department::Column::Deleted.eq(false))
        .one(&*db)
        .await?;
    if existing.is_some() {
        return Err(AppError::Conflict(format!(
            "position {} is already staffed in department {}",
            req.position_id, req.department_id
        )));
    }

    let link = position_department::ActiveModel {
        position_id: Set(req.position_id),
        department_id: Set(req.department_id),
        staff_units: Set(req.figures.staff_units),
        current_count: Set(req.figures.current_count),
        vacancies: Set(req.figures.vacancies),
        sort: Set(req.figures.sort),
        deleted: Set(false),
        ..Default::default()
    }
    .insert(&*db)
    .await?;

    tracing::info!(
        "Staffed position {} in department {}",
        link.position_id,
        link.department_id
    );
    Ok(Json(ApiResponse::success(link)))
}

async fn find_link(db: &DbConn, id: i64) -> AppResult<position_department::Model> {
    position_department::Entity::find_by_id(id)
        .one(&**db)
        .await?
        .filter(|l| !l.deleted)
        .ok_or_not_found(format!("staffing link {} not found", id))
}

/// PUT /api/positiondepartments/:id
pub async fn update_link(
    Extension(db): Extension<DbConn>,
    Path(id): Path<i64>,
    Json(figures): Json<StaffingFigures>,
) -> AppResult<Json<ApiResponse<position_department::Model>>> {
    figures.validate()?;
    let mut active: position_department::ActiveModel = find_link(&db, id).await?.into();
    active.staff_units = Set(figures.staff_units);
    active.current_count = Set(figures.current_count);
    active.vacancies = Set(figures.vacancies);
    active.sort = Set(figures.sort);
    let link = active.update(&*db).await?;
    Ok(Json(ApiResponse::success(link)))
}

/// DELETE /api/positiondepartments/:id
pub async fn delete_link(
    Extension(db): Extension<DbConn>,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<()>>> {
    let mut active: position_department::ActiveModel = find_link(&db, id).await?.into();
    active.deleted = Set(true);
    active.update(&*db).await?;
    tracing::info!("Retired staffing link {}", id);
    Ok(Json(ApiResponse::success_msg("success")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_flattens_figures() {
        let req: CreateStaffingRequest = serde_json::from_str(
            r#"{"position_id":1,"department_id":2,"staff_units":3,"vacancies":1}"#,
        )
        .unwrap();
        assert_eq!(req.figures.staff_units, 3);
        assert_eq!(req.figures.vacancies, 1);
        assert_eq!(req.figures.sort, 0);
        assert!(req.figures.validate().is_ok());
    }

    #[test]
    fn test_negative_figures_rejected() {
        let figures = StaffingFigures {
            vacancies: -1,
            ..Default::default()
        };
        assert!(matches!(figures.validate(), Err(AppError::Validation(_))));
    }
}
