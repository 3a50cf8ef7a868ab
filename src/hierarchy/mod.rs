//! Organization hierarchy
//!
//! Turns the flat organization tables into a forest of department and
//! position nodes. Everything here is synchronous and holds no state between
//! calls; the HTTP layer and the CLI feed it with freshly loaded tables.

pub mod builder;
pub mod cache;
pub mod node;
pub mod reparent;
pub mod tables;

pub use builder::{build_forest, clamp_levels, BuildOptions, HierarchyBuilder, ViewMode};
pub use cache::TreeCache;
pub use node::{render_outline, DepartmentNode, HierarchyNode, HierarchyView, PositionNode, Staffing};
pub use reparent::{
    plan_department_move, plan_position_move, DepartmentTarget, MoveDepartment, MoveError,
    MovePlan, MovePosition, PositionTarget,
};
pub use tables::{build_hierarchy, OrgSources, OrgTables, TableSet};
