//! Re-parenting (drag-and-drop moves)
//!
//! A move never edits rows in place: the current link is soft-deleted and a
//! new one inserted. Planning is pure; the plan is then applied either to
//! in-memory tables or to the database inside one transaction.

use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use thiserror::Error;

use super::tables::OrgTables;
use crate::entity::{department, position_department, position_position};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum MoveError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Invalid(String),

    #[error("{0}")]
    Conflict(String),
}

/// New parent of a position
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum PositionTarget {
    Position(i64),
    Department(i64),
}

/// Move one occurrence of a position (identified by its department context)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovePosition {
    pub position_id: i64,
    pub department_id: i64,
    pub target: PositionTarget,
}

/// New parent of a department
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum DepartmentTarget {
    Department(i64),
    Position(i64),
    /// Detach and become top-level
    Root,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveDepartment {
    pub department_id: i64,
    pub target: DepartmentTarget,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPositionLink {
    pub position_id: i64,
    pub parent_position_id: i64,
    pub department_id: i64,
    pub sort: i32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewStaffingLink {
    pub position_id: i64,
    pub department_id: i64,
    pub staff_units: i32,
    pub current_count: i32,
    pub vacancies: i32,
    pub sort: i32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentParent {
    pub department_id: i64,
    pub parent_department_id: Option<i64>,
    pub parent_position_id: Option<i64>,
}

/// Row changes that carry out a move
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovePlan {
    /// `position_position` ids to soft-delete
    pub retire_position_links: Vec<i64>,
    /// `position_department` ids to soft-delete
    pub retire_staffing_links: Vec<i64>,
    pub add_position_link: Option<NewPositionLink>,
    pub add_staffing_link: Option<NewStaffingLink>,
    pub department_parent: Option<DepartmentParent>,
}

impl MovePlan {
    pub fn is_noop(&self) -> bool {
        self == &MovePlan::default()
    }

    /// Apply the plan to in-memory tables. New rows get the next free id.
    pub fn apply(&self, tables: &mut OrgTables) {
        for row in tables.position_positions.iter_mut() {
            if self.retire_position_links.contains(&row.id) {
                row.deleted = true;
            }
        }
        for row in tables.position_departments.iter_mut() {
            if self.retire_staffing_links.contains(&row.id) {
                row.deleted = true;
            }
        }
        if let Some(link) = &self.add_position_link {
            let id = tables.position_positions.iter().map(|r| r.id).max().unwrap_or(0) + 1;
            tables.position_positions.push(position_position::Model {
                id,
                position_id: link.position_id,
                parent_position_id: link.parent_position_id,
                department_id: link.department_id,
                sort: link.sort,
                deleted: false,
            });
        }
        if let Some(link) = &self.add_staffing_link {
            let id = tables.position_departments.iter().map(|r| r.id).max().unwrap_or(0) + 1;
            tables.position_departments.push(position_department::Model {
                id,
                position_id: link.position_id,
                department_id: link.department_id,
                staff_units: link.staff_units,
                current_count: link.current_count,
                vacancies: link.vacancies,
                sort: link.sort,
                deleted: false,
            });
        }
        if let Some(parent) = &self.department_parent {
            if let Some(dept) = tables
                .departments
                .iter_mut()
                .find(|d| d.department_id == parent.department_id)
            {
                dept.parent_department_id = parent.parent_department_id;
                dept.parent_position_id = parent.parent_position_id;
            }
        }
    }
}

fn active_position(tables: &OrgTables, position_id: i64) -> bool {
    tables
        .positions
        .iter()
        .any(|p| p.position_id == position_id && !p.deleted)
}

fn active_department(tables: &OrgTables, department_id: i64) -> Option<&department::Model> {
    tables
        .departments
        .iter()
        .find(|d| d.department_id == department_id && !d.deleted)
}

fn staffing_link(
    tables: &OrgTables,
    position_id: i64,
    department_id: i64,
) -> Option<&position_department::Model> {
    tables
        .position_departments
        .iter()
        .find(|l| l.position_id == position_id && l.department_id == department_id && !l.deleted)
}

/// Whether `candidate` sits somewhere below `position_id` within `department_id`
pub fn is_subordinate(
    lines: &[position_position::Model],
    department_id: i64,
    position_id: i64,
    candidate: i64,
) -> bool {
    let mut seen = HashSet::new();
    let mut queue = VecDeque::from([position_id]);
    while let Some(current) = queue.pop_front() {
        if !seen.insert(current) {
            continue;
        }
        for line in lines.iter().filter(|l| {
            !l.deleted && l.department_id == department_id && l.parent_position_id == current
        }) {
            if line.position_id == candidate {
                return true;
            }
            queue.push_back(line.position_id);
        }
    }
    false
}

/// Plan moving a position occurrence under a new parent
pub fn plan_position_move(tables: &OrgTables, req: &MovePosition) -> Result<MovePlan, MoveError> {
    if !active_position(tables, req.position_id) {
        return Err(MoveError::NotFound(format!("position {} not found", req.position_id)));
    }
    let current_link = staffing_link(tables, req.position_id, req.department_id).ok_or_else(|| {
        MoveError::NotFound(format!(
            "position {} is not staffed in department {}",
            req.position_id, req.department_id
        ))
    })?;

    let current_parents: Vec<i64> = tables
        .position_positions
        .iter()
        .filter(|l| {
            !l.deleted && l.position_id == req.position_id && l.department_id == req.department_id
        })
        .map(|l| l.id)
        .collect();

    match req.target {
        PositionTarget::Position(parent_id) => {
            if parent_id == req.position_id {
                return Err(MoveError::Invalid("a position cannot report to itself".to_string()));
            }
            if !active_position(tables, parent_id) {
                return Err(MoveError::NotFound(format!("position {} not found", parent_id)));
            }
            if staffing_link(tables, parent_id, req.department_id).is_none() {
                return Err(MoveError::Invalid(format!(
                    "position {} is not staffed in department {}",
                    parent_id, req.department_id
                )));
            }
            if is_subordinate(&tables.position_positions, req.department_id, req.position_id, parent_id) {
                return Err(MoveError::Invalid(format!(
                    "position {} reports to position {}; the move would create a cycle",
                    parent_id, req.position_id
                )));
            }
            let sort = tables
                .position_positions
                .iter()
                .filter(|l| {
                    !l.deleted
                        && l.parent_position_id == parent_id
                        && l.department_id == req.department_id
                })
                .map(|l| l.sort)
                .max()
                .map_or(0, |s| s + 1);

            Ok(MovePlan {
                retire_position_links: current_parents,
                add_position_link: Some(NewPositionLink {
                    position_id: req.position_id,
                    parent_position_id: parent_id,
                    department_id: req.department_id,
                    sort,
                }),
                ..Default::default()
            })
        }
        PositionTarget::Department(department_id) if department_id == req.department_id => {
            Ok(MovePlan {
                retire_position_links: current_parents,
                ..Default::default()
            })
        }
        PositionTarget::Department(department_id) => {
            if active_department(tables, department_id).is_none() {
                return Err(MoveError::NotFound(format!("department {} not found", department_id)));
            }
            if staffing_link(tables, req.position_id, department_id).is_some() {
                return Err(MoveError::Conflict(format!(
                    "position {} is already staffed in department {}",
                    req.position_id, department_id
                )));
            }
            let has_subordinates = tables.position_positions.iter().any(|l| {
                !l.deleted
                    && l.parent_position_id == req.position_id
                    && l.department_id == req.department_id
            });
            if has_subordinates {
                return Err(MoveError::Conflict(format!(
                    "position {} has subordinates in department {}",
                    req.position_id, req.department_id
                )));
            }
            let sort = tables
                .position_departments
                .iter()
                .filter(|l| !l.deleted && l.department_id == department_id)
                .map(|l| l.sort)
                .max()
                .map_or(0, |s| s + 1);

            Ok(MovePlan {
                retire_position_links: current_parents,
                retire_staffing_links: vec![current_link.id],
                add_staffing_link: Some(NewStaffingLink {
                    position_id: req.position_id,
                    department_id,
                    staff_units: current_link.staff_units,
                    current_count: current_link.current_count,
                    vacancies: current_link.vacancies,
                    sort,
                }),
                ..Default::default()
            })
        }
    }
}

/// Positions shown inside `department_id`: staffed there, or reporting to
/// another position there
fn positions_in_department(tables: &OrgTables, department_id: i64) -> HashSet<i64> {
    let staffed = tables
        .position_departments
        .iter()
        .filter(|l| !l.deleted && l.department_id == department_id)
        .map(|l| l.position_id);
    let reporting = tables
        .position_positions
        .iter()
        .filter(|l| !l.deleted && l.department_id == department_id)
        .map(|l| l.position_id);
    staffed.chain(reporting).collect()
}

/// Departments below `department_id`, through either kind of parent link
fn descendant_departments(tables: &OrgTables, department_id: i64) -> HashSet<i64> {
    let mut found = HashSet::new();
    let mut queue = VecDeque::from([department_id]);
    while let Some(current) = queue.pop_front() {
        let inside = positions_in_department(tables, current);
        for dept in tables.departments.iter().filter(|d| !d.deleted) {
            let below = dept.parent_department_id == Some(current)
                || dept.parent_position_id.is_some_and(|p| inside.contains(&p));
            if below && dept.department_id != department_id && found.insert(dept.department_id) {
                queue.push_back(dept.department_id);
            }
        }
    }
    found
}

/// Departments that would drop out of the tree if `department_id` went away:
/// its sub-departments, and departments hanging off positions that appear in
/// no other department
pub fn dependent_departments(tables: &OrgTables, department_id: i64) -> Vec<i64> {
    let inside = positions_in_department(tables, department_id);
    let elsewhere: HashSet<i64> = tables
        .departments
        .iter()
        .filter(|d| !d.deleted && d.department_id != department_id)
        .flat_map(|d| positions_in_department(tables, d.department_id))
        .collect();

    let mut dependents: Vec<i64> = tables
        .departments
        .iter()
        .filter(|d| !d.deleted && d.department_id != department_id)
        .filter(|d| {
            d.parent_department_id == Some(department_id)
                || d.parent_position_id
                    .is_some_and(|p| inside.contains(&p) && !elsewhere.contains(&p))
        })
        .map(|d| d.department_id)
        .collect();
    dependents.sort_unstable();
    dependents
}

/// Plan moving a department under a new parent
pub fn plan_department_move(
    tables: &OrgTables,
    req: &MoveDepartment,
) -> Result<MovePlan, MoveError> {
    if active_department(tables, req.department_id).is_none() {
        return Err(MoveError::NotFound(format!("department {} not found", req.department_id)));
    }
    let mut subtree = descendant_departments(tables, req.department_id);
    subtree.insert(req.department_id);

    let (parent_department_id, parent_position_id) = match req.target {
        DepartmentTarget::Root => (None, None),
        DepartmentTarget::Department(parent_id) => {
            if active_department(tables, parent_id).is_none() {
                return Err(MoveError::NotFound(format!("department {} not found", parent_id)));
            }
            if subtree.contains(&parent_id) {
                return Err(MoveError::Invalid(format!(
                    "department {} is inside department {}",
                    parent_id, req.department_id
                )));
            }
            (Some(parent_id), None)
        }
        DepartmentTarget::Position(position_id) => {
            if !active_position(tables, position_id) {
                return Err(MoveError::NotFound(format!("position {} not found", position_id)));
            }
            let inside = subtree
                .iter()
                .any(|d| positions_in_department(tables, *d).contains(&position_id));
            if inside {
                return Err(MoveError::Invalid(format!(
                    "position {} sits inside department {}",
                    position_id, req.department_id
                )));
            }
            (None, Some(position_id))
        }
    };

    Ok(MovePlan {
        department_parent: Some(DepartmentParent {
            department_id: req.department_id,
            parent_department_id,
            parent_position_id,
        }),
        ..Default::default()
    })
}
