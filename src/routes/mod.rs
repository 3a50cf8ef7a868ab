use axum::{
    http::StatusCode,
    middleware,
    response::Json,
    routing::{delete, get, post, put},
    Router,
};
use serde::Serialize;
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use crate::handlers;
use crate::middleware::db_layer;
use crate::state::AppState;

pub mod health;

/// API response wrapper: `{status, data}` or `{status, message, details}`
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: "success".to_string(),
            message: None,
            details: None,
            data: Some(data),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: Some(message.into()),
            details: None,
            data: None,
        }
    }

    pub fn with_details(mut self, details: Option<String>) -> Self {
        self.details = details;
        self
    }
}

impl ApiResponse<()> {
    pub fn success_msg(message: impl Into<String>) -> Self {
        Self {
            status: "success".to_string(),
            message: Some(message.into()),
            details: None,
            data: None,
        }
    }
}

/// Create the main router
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/health", get(health::health_check))
        // Departments
        .route(
            "/departments",
            get(handlers::department::list_departments).post(handlers::department::create_department),
        )
        .route(
            "/departments/:id",
            put(handlers::department::update_department).delete(handlers::department::delete_department),
        )
        // Positions
        .route(
            "/positions",
            get(handlers::position::list_positions).post(handlers::position::create_position),
        )
        .route(
            "/positions/with-departments",
            get(handlers::position::list_positions_with_departments),
        )
        .route(
            "/positions/:id",
            put(handlers::position::update_position).delete(handlers::position::delete_position),
        )
        // Staffing links
        .route(
            "/positiondepartments",
            get(handlers::position_department::list_links)
                .post(handlers::position_department::create_link),
        )
        .route(
            "/positiondepartments/:id",
            put(handlers::position_department::update_link)
                .delete(handlers::position_department::delete_link),
        )
        // Reporting lines
        .route(
            "/positionpositions",
            get(handlers::position_position::list_lines)
                .post(handlers::position_position::create_line),
        )
        .route(
            "/positionpositions/:id",
            delete(handlers::position_position::delete_line),
        )
        // Employees
        .route(
            "/employees",
            get(handlers::employee::list_employees).post(handlers::employee::create_employee),
        )
        .route(
            "/employees/:id",
            put(handlers::employee::update_employee).delete(handlers::employee::delete_employee),
        )
        // Org chart
        .route("/tree", get(handlers::tree::get_tree))
        .route("/tree/move", post(handlers::tree::move_node))
        .route(
            "/settings",
            get(handlers::settings::get_settings).put(handlers::settings::update_settings),
        )
        .fallback(fallback);

    // Serves the built frontend, falling back to index.html for SPA routing
    let static_dir = &state.config.static_dir;
    let serve_dir = ServeDir::new(static_dir)
        .not_found_service(ServeFile::new(static_dir.join("index.html")));

    Router::new()
        .nest("/api", api_routes)
        .fallback_service(serve_dir)
        .layer(middleware::from_fn_with_state(state.clone(), db_layer))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Fallback handler for unknown API paths
pub async fn fallback() -> (StatusCode, Json<ApiResponse<()>>) {
    (StatusCode::NOT_FOUND, Json(ApiResponse::error("Not Found")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::entity::{department, employee, position, position_department, position_position};
    use crate::hierarchy::builder::tests::{chain, dept, line, pos, staff};
    use crate::hierarchy::OrgTables;

    fn app(db: MockDatabase) -> Router {
        create_router(AppState::new(db.into_connection(), Config::default()))
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        send(app, "GET", uri, None).await
    }

    async fn send(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    /// Queue the five table loads in loader order
    fn with_tables(db: MockDatabase, tables: OrgTables) -> MockDatabase {
        db.append_query_results([tables.departments])
            .append_query_results([tables.positions])
            .append_query_results([tables.position_departments])
            .append_query_results([tables.position_positions])
            .append_query_results([tables.employees])
    }

    fn exec(rows_affected: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected,
        }
    }

    fn app_with(conn: &DatabaseConnection) -> Router {
        create_router(AppState::new(conn.clone(), Config::default()))
    }

    #[test]
    fn test_error_envelope() {
        let body = serde_json::to_value(
            ApiResponse::<()>::error("Conflict").with_details(Some("busy".to_string())),
        )
        .unwrap();
        assert_eq!(body["status"], "error");
        assert_eq!(body["message"], "Conflict");
        assert_eq!(body["details"], "busy");
        assert!(body.get("data").is_none());
    }

    #[tokio::test]
    async fn test_health_route() {
        let (status, body) = get_json(app(MockDatabase::new(DatabaseBackend::Postgres)), "/api/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert_eq!(body["data"]["status"], "healthy");
    }

    #[tokio::test]
    async fn test_unknown_api_path() {
        let (status, body) = get_json(app(MockDatabase::new(DatabaseBackend::Postgres)), "/api/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["status"], "error");
    }

    #[tokio::test]
    async fn test_list_departments_route() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![dept(1, None, None), dept(2, Some(1), None)]]);
        let (status, body) = get_json(app(db), "/api/departments").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 2);
        assert_eq!(body["data"][1]["parent_department_id"], 1);
    }

    #[tokio::test]
    async fn test_tree_route() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![dept(1, None, None)]])
            .append_query_results([vec![pos(1)]])
            .append_query_results([vec![staff(1, 1, 1, 2)]])
            .append_query_results([Vec::<position_position::Model>::new()])
            .append_query_results([Vec::<employee::Model>::new()]);
        let (status, body) = get_json(app(db), "/api/tree?levels=2").await;
        assert_eq!(status, StatusCode::OK);

        let data = &body["data"];
        assert_eq!(data["levels"], 2);
        assert_eq!(data["view"], "organization");
        assert_eq!(data["state"], "ready");
        assert_eq!(data["nodes"][0]["key"], "dept_1");
        assert_eq!(data["nodes"][0]["children"][0]["key"], "pos_1_1");
        assert_eq!(data["nodes"][0]["children"][0]["staffing"]["vacancies"], 2);
    }

    #[tokio::test]
    async fn test_tree_rejects_out_of_range_levels() {
        let (status, body) = get_json(app(MockDatabase::new(DatabaseBackend::Postgres)), "/api/tree?levels=6").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Validation Error");
    }

    #[tokio::test]
    async fn test_tree_route_empty() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<department::Model>::new()])
            .append_query_results([Vec::<position::Model>::new()])
            .append_query_results([Vec::<position_department::Model>::new()])
            .append_query_results([Vec::<position_position::Model>::new()])
            .append_query_results([Vec::<employee::Model>::new()]);
        let (_, body) = get_json(app(db), "/api/tree?levels=3").await;
        assert_eq!(body["data"]["state"], "empty");
        assert_eq!(body["data"]["nodes"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_move_route_writes_plan() {
        // Chain D1: P1 -> P2 -> P3; move P3 up under P1
        let moved = position_position::Model {
            id: 3,
            position_id: 3,
            parent_position_id: 1,
            department_id: 1,
            sort: 1,
            deleted: false,
        };
        let conn = with_tables(MockDatabase::new(DatabaseBackend::Postgres), chain())
            .append_exec_results([exec(1)])
            .append_query_results([vec![moved]])
            .into_connection();

        let body = json!({
            "node": "position",
            "position_id": 3,
            "department_id": 1,
            "target": {"kind": "position", "id": 1}
        });
        let (status, body) = send(app_with(&conn), "POST", "/api/tree/move", Some(body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["retire_position_links"], json!([2]));
        assert_eq!(body["data"]["add_position_link"]["parent_position_id"], 1);
        assert_eq!(body["data"]["add_position_link"]["sort"], 1);

        let log = format!("{:?}", conn.into_transaction_log());
        assert!(log.contains("UPDATE"));
        assert!(log.contains("INSERT INTO"));
    }

    #[tokio::test]
    async fn test_move_route_rejects_cycle() {
        let conn = with_tables(MockDatabase::new(DatabaseBackend::Postgres), chain()).into_connection();
        let body = json!({
            "node": "position",
            "position_id": 1,
            "department_id": 1,
            "target": {"kind": "position", "id": 3}
        });
        let (status, body) = send(app_with(&conn), "POST", "/api/tree/move", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");

        let log = format!("{:?}", conn.into_transaction_log());
        assert!(!log.contains("INSERT INTO"));
    }

    fn line_lookups(position_id: i64, parent_id: i64) -> MockDatabase {
        MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![pos(position_id)]])
            .append_query_results([vec![pos(parent_id)]])
            .append_query_results([vec![dept(1, None, None)]])
            .append_query_results([vec![line(1, 2, 1, 1), line(2, 3, 2, 1)]])
    }

    #[tokio::test]
    async fn test_create_line_conflicts_and_cycles() {
        // P3 already reports to P2 in D1
        let body = json!({"position_id": 3, "parent_position_id": 1, "department_id": 1});
        let (status, _) = send(app(line_lookups(3, 1)), "POST", "/api/positionpositions", Some(body)).await;
        assert_eq!(status, StatusCode::CONFLICT);

        // P3 sits below P1, so P1 cannot report to it
        let body = json!({"position_id": 1, "parent_position_id": 3, "department_id": 1});
        let (status, body) = send(app(line_lookups(1, 3)), "POST", "/api/positionpositions", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Validation Error");
    }

    #[tokio::test]
    async fn test_delete_department_with_dependents() {
        let tables = OrgTables {
            departments: vec![dept(1, None, None), dept(2, Some(1), None)],
            ..Default::default()
        };
        let db = with_tables(
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([vec![dept(1, None, None)]]),
            tables,
        );
        let (status, body) = send(app(db), "DELETE", "/api/departments/1", None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body["details"].as_str().unwrap().contains("[2]"));
    }

    #[tokio::test]
    async fn test_delete_department_hanging_off_position() {
        // D2 hangs off P1, which only appears in D1
        let tables = OrgTables {
            departments: vec![dept(1, None, None), dept(2, None, Some(1))],
            positions: vec![pos(1)],
            position_departments: vec![staff(1, 1, 1, 0)],
            ..Default::default()
        };
        let db = with_tables(
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([vec![dept(1, None, None)]]),
            tables,
        );
        let (status, _) = send(app(db), "DELETE", "/api/departments/1", None).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    fn person(id: i64, manager_id: Option<i64>) -> employee::Model {
        employee::Model {
            employee_id: id,
            full_name: format!("E{}", id),
            position_id: None,
            department_id: None,
            manager_id,
        }
    }

    #[tokio::test]
    async fn test_create_employee_route() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![person(7, None)]])
            .append_query_results([vec![person(8, Some(7))]]);
        let body = json!({"full_name": " E8 ", "manager_id": 7});
        let (status, body) = send(app(db), "POST", "/api/employees", Some(body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["manager_id"], 7);

        let body = json!({"full_name": "   "});
        let (status, _) = send(app(MockDatabase::new(DatabaseBackend::Postgres)), "POST", "/api/employees", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_delete_employee_clears_reports() {
        let conn = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([exec(2), exec(1)])
            .into_connection();
        let (status, body) = send(app_with(&conn), "DELETE", "/api/employees/7", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");

        let log = format!("{:?}", conn.into_transaction_log());
        assert!(log.contains("manager_id"));
        assert!(log.contains("DELETE FROM"));
    }

    #[tokio::test]
    async fn test_delete_missing_employee() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).append_exec_results([exec(0), exec(0)]);
        let (status, _) = send(app(db), "DELETE", "/api/employees/99", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
