//! Organization tree handlers
//!
//! `GET /api/tree` builds the hierarchy server-side; `POST /api/tree/move`
//! is the drag-and-drop write path.

use axum::{
    extract::{Query, State},
    response::Json,
    Extension,
};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, DbErr, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};

use super::settings::hierarchy_levels;
use crate::entity::{department, position_department, position_position};
use crate::error::{AppError, AppResult};
use crate::hierarchy::builder::{MAX_LEVELS, MIN_LEVELS};
use crate::hierarchy::{
    plan_department_move, plan_position_move, BuildOptions, HierarchyNode, MoveDepartment,
    MoveError, MovePlan, MovePosition, OrgTables, ViewMode,
};
use crate::middleware::DbConn;
use crate::routes::ApiResponse;
use crate::source::{load_tables, DatabaseSource, OrgSource};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct TreeQuery {
    /// Depth limit; the stored setting applies when absent
    pub levels: Option<u32>,
    pub focus_position_id: Option<i64>,
    pub focus_department_id: Option<i64>,
    /// Department context for the focused position
    pub department_id: Option<i64>,
    #[serde(default)]
    pub view: ViewMode,
}

#[derive(Debug, Serialize)]
pub struct TreeResponse {
    pub levels: u32,
    pub view: ViewMode,
    /// "ready", or "empty" when no structure is configured
    pub state: &'static str,
    pub nodes: Vec<HierarchyNode>,
}

/// GET /api/tree
pub async fn get_tree(
    State(state): State<AppState>,
    Extension(db): Extension<DbConn>,
    Query(query): Query<TreeQuery>,
) -> AppResult<Json<ApiResponse<TreeResponse>>> {
    let levels = match query.levels {
        Some(levels) if (MIN_LEVELS..=MAX_LEVELS).contains(&levels) => levels,
        Some(levels) => {
            return Err(AppError::Validation(format!(
                "levels must be between {} and {}, got {}",
                MIN_LEVELS, MAX_LEVELS, levels
            )))
        }
        None => hierarchy_levels(&db, state.default_levels()).await?,
    };

    let options = BuildOptions {
        max_depth: levels,
        focus_position_id: query.focus_position_id,
        focus_department_id: query.focus_department_id,
        context_department_id: query.department_id,
        view: query.view,
    };

    let tables = DatabaseSource::new(db.0.clone()).load().await?;
    let nodes = state.trees.get_or_build(&tables, &options);

    Ok(Json(ApiResponse::success(TreeResponse {
        levels,
        view: options.view,
        state: if nodes.is_empty() { "empty" } else { "ready" },
        nodes: (*nodes).clone(),
    })))
}

/// Body of `POST /api/tree/move`
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum MoveRequest {
    Position(MovePosition),
    Department(MoveDepartment),
}

impl MoveRequest {
    /// Validate the move against `tables` and return the row changes
    pub fn plan(&self, tables: &OrgTables) -> Result<MovePlan, MoveError> {
        match self {
            MoveRequest::Position(mv) => plan_position_move(tables, mv),
            MoveRequest::Department(mv) => plan_department_move(tables, mv),
        }
    }
}

/// POST /api/tree/move
///
/// Loads the tables, plans the move and writes it inside one transaction,
/// so concurrent moves cannot both pass the cycle checks. Returns the
/// applied plan.
pub async fn move_node(
    Extension(db): Extension<DbConn>,
    Json(req): Json<MoveRequest>,
) -> AppResult<Json<ApiResponse<MovePlan>>> {
    let plan = (&*db)
        .transaction::<_, MovePlan, AppError>(|txn| {
            Box::pin(async move {
                let tables = load_tables(txn).await?;
                let plan = req.plan(&tables)?;
                if !plan.is_noop() {
                    apply_move_plan(txn, &plan).await?;
                    tracing::info!("Applied move {:?}", req);
                }
                Ok(plan)
            })
        })
        .await?;

    Ok(Json(ApiResponse::success(plan)))
}

/// Write a move plan: retire old links, insert new ones, update parents
async fn apply_move_plan(txn: &DatabaseTransaction, plan: &MovePlan) -> Result<(), DbErr> {
    if !plan.retire_position_links.is_empty() {
        position_position::Entity::update_many()
            .col_expr(position_position::Column::Deleted, Expr::value(true))
            .filter(position_position::Column::Id.is_in(plan.retire_position_links.clone()))
            .exec(txn)
            .await?;
    }
    if !plan.retire_staffing_links.is_empty() {
        position_department::Entity::update_many()
            .col_expr(position_department::Column::Deleted, Expr::value(true))
            .filter(position_department::Column::Id.is_in(plan.retire_staffing_links.clone()))
            .exec(txn)
            .await?;
    }
    if let Some(link) = &plan.add_position_link {
        position_position::ActiveModel {
            position_id: Set(link.position_id),
            parent_position_id: Set(link.parent_position_id),
            department_id: Set(link.department_id),
            sort: Set(link.sort),
            deleted: Set(false),
            ..Default::default()
        }
        .insert(txn)
        .await?;
    }
    if let Some(link) = &plan.add_staffing_link {
        position_department::ActiveModel {
            position_id: Set(link.position_id),
            department_id: Set(link.department_id),
            staff_units: Set(link.staff_units),
            current_count: Set(link.current_count),
            vacancies: Set(link.vacancies),
            sort: Set(link.sort),
            deleted: Set(false),
            ..Default::default()
        }
        .insert(txn)
        .await?;
    }
    if let Some(parent) = &plan.department_parent {
        department::Entity::update_many()
            .col_expr(
                department::Column::ParentDepartmentId,
                Expr::value(parent.parent_department_id),
            )
            .col_expr(
                department::Column::ParentPositionId,
                Expr::value(parent.parent_position_id),
            )
            .filter(department::Column::DepartmentId.eq(parent.department_id))
            .exec(txn)
            .await?;
    }
    Ok(())
}
