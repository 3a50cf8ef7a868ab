//! Settings handlers
//!
//! Only `hierarchy_levels` is stored today: the default depth of the org chart.

use axum::{extract::State, response::Json, Extension};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use serde::{Deserialize, Serialize};

use crate::entity::setting::{self, HIERARCHY_LEVELS};
use crate::error::{AppError, AppResult};
use crate::hierarchy::builder::{MAX_LEVELS, MIN_LEVELS};
use crate::middleware::DbConn;
use crate::routes::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct Settings {
    pub hierarchy_levels: i64,
}

/// Stored level count, or `fallback` when unset or unreadable
pub async fn hierarchy_levels(db: &DatabaseConnection, fallback: u32) -> AppResult<u32> {
    let stored = setting::Entity::find_by_id(HIERARCHY_LEVELS.to_string())
        .one(db)
        .await?;
    let Some(stored) = stored else {
        return Ok(fallback);
    };
    match stored.value.trim().parse::<u32>() {
        Ok(levels) if (MIN_LEVELS..=MAX_LEVELS).contains(&levels) => Ok(levels),
        _ => {
            tracing::warn!(
                "Ignoring invalid {} setting '{}', using {}",
                HIERARCHY_LEVELS,
                stored.value,
                fallback
            );
            Ok(fallback)
        }
    }
}

/// GET /api/settings
pub async fn get_settings(
    State(state): State<AppState>,
    Extension(db): Extension<DbConn>,
) -> AppResult<Json<ApiResponse<Settings>>> {
    let levels = hierarchy_levels(&db, state.default_levels()).await?;
    Ok(Json(ApiResponse::success(Settings {
        hierarchy_levels: levels as i64,
    })))
}

/// PUT /api/settings
pub async fn update_settings(
    Extension(db): Extension<DbConn>,
    Json(req): Json<Settings>,
) -> AppResult<Json<ApiResponse<Settings>>> {
    if req.hierarchy_levels < MIN_LEVELS as i64 || req.hierarchy_levels > MAX_LEVELS as i64 {
        return Err(AppError::Validation(format!(
            "hierarchy_levels must be between {} and {}",
            MIN_LEVELS, MAX_LEVELS
        )));
    }

    let value = req.hierarchy_levels.to_string();
    let existing = setting::Entity::find_by_id(HIERARCHY_LEVELS.to_string())
        .one(&*db)
        .await?;
    match existing {
        Some(row) => {
            let mut active: setting::ActiveModel = row.into();
            active.value = Set(value);
            active.update(&*db).await?;
        }
        None => {
            setting::ActiveModel {
                key: Set(HIERARCHY_LEVELS.to_string()),
                value: Set(value),
            }
            .insert(&*db)
            .await?;
        }
    }

    tracing::info!("{} set to {}", HIERARCHY_LEVELS, req.hierarchy_levels);
    Ok(Json(ApiResponse::success(req)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn stored(value: &str) -> setting::Model {
        setting::Model {
            key: HIERARCHY_LEVELS.to_string(),
            value: value.to_string(),
        }
    }

    #[tokio::test]
    async fn test_stored_levels_win() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![stored("4")]])
            .into_connection();
        assert_eq!(hierarchy_levels(&db, 2).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_missing_or_invalid_levels_fall_back() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<setting::Model>::new()])
            .append_query_results([vec![stored("9")]])
            .append_query_results([vec![stored("many")]])
            .into_connection();
        assert_eq!(hierarchy_levels(&db, 2).await.unwrap(), 2);
        assert_eq!(hierarchy_levels(&db, 2).await.unwrap(), 2);
        assert_eq!(hierarchy_levels(&db, 3).await.unwrap(), 3);
    }
}
