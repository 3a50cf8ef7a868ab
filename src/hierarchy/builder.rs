//! Hierarchy builder
//!
//! Assembles department and position nodes from the flat organization
//! tables. The builder indexes the tables once and then constructs the
//! forest depth-first. Recursion stops at `max_depth`, which also bounds
//! traversal of cyclic reporting lines; cycles are not detected here.
//!
//! Rows flagged `deleted` and links pointing at missing entities are ignored.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use super::node::{department_key, position_key, DepartmentNode, HierarchyNode, PositionNode, Staffing};
use super::tables::TableSet;
use crate::entity::{department, employee, position, position_department, position_position};

pub const MIN_LEVELS: u32 = 1;
pub const MAX_LEVELS: u32 = 5;

/// Clamp a configured level count into the supported range
pub fn clamp_levels(levels: i64) -> u32 {
    levels.clamp(MIN_LEVELS as i64, MAX_LEVELS as i64) as u32
}

/// Shape of the default (unfocused) forest
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    /// Top-level departments as roots, departments and positions interleaved
    #[default]
    Organization,
    /// Positions only, rooted at positions that report to nobody
    Positions,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BuildOptions {
    pub max_depth: u32,
    /// Root the forest at this position (drill-down)
    #[serde(default)]
    pub focus_position_id: Option<i64>,
    /// Root the forest at this department; ignored when a focus position is set
    #[serde(default)]
    pub focus_department_id: Option<i64>,
    /// Department context for the focused position
    #[serde(default)]
    pub context_department_id: Option<i64>,
    #[serde(default)]
    pub view: ViewMode,
}

impl BuildOptions {
    pub fn new(max_depth: u32) -> Self {
        Self {
            max_depth,
            focus_position_id: None,
            focus_department_id: None,
            context_department_id: None,
            view: ViewMode::Organization,
        }
    }

    pub fn focus_position(mut self, position_id: i64, context: Option<i64>) -> Self {
        self.focus_position_id = Some(position_id);
        self.context_department_id = context;
        self
    }

    pub fn focus_department(mut self, department_id: i64) -> Self {
        self.focus_department_id = Some(department_id);
        self
    }

    pub fn view(mut self, view: ViewMode) -> Self {
        self.view = view;
        self
    }
}

/// Build the forest for `tables` in one call
pub fn build_forest(tables: TableSet<'_>, options: &BuildOptions) -> Vec<HierarchyNode> {
    HierarchyBuilder::new(tables).build(options)
}

/// Indexed view of the organization tables
pub struct HierarchyBuilder<'a> {
    positions: HashMap<i64, &'a position::Model>,
    departments: HashMap<i64, &'a department::Model>,
    /// Active staffing link per (position, department)
    staffing: HashMap<(i64, i64), &'a position_department::Model>,
    /// Staffing links per department, by (sort, position_id)
    links_by_department: HashMap<i64, Vec<&'a position_department::Model>>,
    /// Staffing links per position, by (sort, department_id)
    links_by_position: HashMap<i64, Vec<&'a position_department::Model>>,
    employees: HashMap<(i64, i64), Vec<&'a employee::Model>>,
    employees_by_position: HashMap<i64, Vec<&'a employee::Model>>,
    /// Positions that are the child side of any reporting line
    child_position_ids: HashSet<i64>,
    /// (position, department) pairs where the position reports to another position
    scoped_children: HashSet<(i64, i64)>,
    /// Reporting lines per (parent position, department), by (sort, position_id)
    subordinates: HashMap<(i64, i64), Vec<&'a position_position::Model>>,
    departments_by_parent_department: HashMap<i64, Vec<&'a department::Model>>,
    departments_by_parent_position: HashMap<i64, Vec<&'a department::Model>>,
    /// Top-level departments, organizations first
    top_level: Vec<&'a department::Model>,
}

impl<'a> HierarchyBuilder<'a> {
    pub fn new(tables: TableSet<'a>) -> Self {
        let positions: HashMap<i64, &position::Model> = tables
            .positions
            .iter()
            .filter(|p| !p.deleted)
            .map(|p| (p.position_id, p))
            .collect();
        let departments: HashMap<i64, &department::Model> = tables
            .departments
            .iter()
            .filter(|d| !d.deleted)
            .map(|d| (d.department_id, d))
            .collect();

        let mut skipped = 0usize;

        let mut staffing = HashMap::new();
        let mut links_by_department: HashMap<i64, Vec<&position_department::Model>> = HashMap::new();
        let mut links_by_position: HashMap<i64, Vec<&position_department::Model>> = HashMap::new();
        for link in tables.position_departments.iter().filter(|l| !l.deleted) {
            if !positions.contains_key(&link.position_id)
                || !departments.contains_key(&link.department_id)
            {
                skipped += 1;
                continue;
            }
            // First active link wins for a duplicated pair
            if staffing
                .insert((link.position_id, link.department_id), link)
                .is_some()
            {
                skipped += 1;
                continue;
            }
            links_by_department.entry(link.department_id).or_default().push(link);
            links_by_position.entry(link.position_id).or_default().push(link);
        }
        for links in links_by_department.values_mut() {
            links.sort_by_key(|l| (l.sort, l.position_id));
        }
        for links in links_by_position.values_mut() {
            links.sort_by_key(|l| (l.sort, l.department_id));
        }

        let mut employees: HashMap<(i64, i64), Vec<&employee::Model>> = HashMap::new();
        let mut employees_by_position: HashMap<i64, Vec<&employee::Model>> = HashMap::new();
        for emp in tables.employees {
            if let Some(seat) = emp.seat() {
                employees.entry(seat).or_default().push(emp);
                employees_by_position.entry(seat.0).or_default().push(emp);
            }
        }
        for list in employees.values_mut().chain(employees_by_position.values_mut()) {
            list.sort_by_key(|e| e.employee_id);
        }

        let mut child_position_ids = HashSet::new();
        let mut scoped_children = HashSet::new();
        let mut seen_lines = HashSet::new();
        let mut subordinates: HashMap<(i64, i64), Vec<&position_position::Model>> = HashMap::new();
        for line in tables.position_positions.iter().filter(|l| !l.deleted) {
            if !positions.contains_key(&line.position_id)
                || !positions.contains_key(&line.parent_position_id)
                || !departments.contains_key(&line.department_id)
            {
                skipped += 1;
                continue;
            }
            if !seen_lines.insert((line.position_id, line.parent_position_id, line.department_id)) {
                skipped += 1;
                continue;
            }
            child_position_ids.insert(line.position_id);
            scoped_children.insert((line.position_id, line.department_id));
            subordinates
                .entry((line.parent_position_id, line.department_id))
                .or_default()
                .push(line);
        }
        for lines in subordinates.values_mut() {
            lines.sort_by_key(|l| (l.sort, l.position_id));
        }

        let mut departments_by_parent_department: HashMap<i64, Vec<&department::Model>> = HashMap::new();
        let mut departments_by_parent_position: HashMap<i64, Vec<&department::Model>> = HashMap::new();
        let mut top_level = Vec::new();
        for dept in departments.values().copied() {
            match (dept.parent_department_id, dept.parent_position_id) {
                _ if dept.is_top_level() => top_level.push(dept),
                (Some(parent), _) if departments.contains_key(&parent) => {
                    departments_by_parent_department.entry(parent).or_default().push(dept);
                }
                (None, Some(parent)) if positions.contains_key(&parent) => {
                    departments_by_parent_position.entry(parent).or_default().push(dept);
                }
                // Dangling parent: unreachable, never shown
                _ => skipped += 1,
            }
        }
        for list in departments_by_parent_department
            .values_mut()
            .chain(departments_by_parent_position.values_mut())
        {
            list.sort_by_key(|d| d.department_id);
        }
        top_level.sort_by_key(|d| (!d.is_organization, d.department_id));

        if skipped > 0 {
            tracing::debug!("Hierarchy index skipped {} stale or duplicate rows", skipped);
        }

        Self {
            positions,
            departments,
            staffing,
            links_by_department,
            links_by_position,
            employees,
            employees_by_position,
            child_position_ids,
            scoped_children,
            subordinates,
            departments_by_parent_department,
            departments_by_parent_position,
            top_level,
        }
    }

    /// Build the forest for the given options
    pub fn build(&self, options: &BuildOptions) -> Vec<HierarchyNode> {
        let walker = Walker {
            index: self,
            max_depth: options.max_depth.clamp(MIN_LEVELS, MAX_LEVELS),
            view: options.view,
        };

        let roots = if let Some(position_id) = options.focus_position_id {
            match self.positions.get(&position_id) {
                Some(position) => {
                    let context = self.focus_context(position_id, options.context_department_id);
                    vec![walker.position_node(position, context, 0)]
                }
                None => Vec::new(),
            }
        } else if let Some(department_id) = options.focus_department_id {
            match self.departments.get(&department_id) {
                Some(dept) => vec![walker.department_node(dept, 0)],
                None => Vec::new(),
            }
        } else {
            match options.view {
                ViewMode::Organization => self
                    .top_level
                    .iter()
                    .map(|dept| walker.department_node(dept, 0))
                    .collect(),
                ViewMode::Positions => self
                    .root_positions()
                    .into_iter()
                    .map(|(position, department_id)| walker.position_node(position, Some(department_id), 0))
                    .collect(),
            }
        };

        tracing::debug!(
            "Built hierarchy: {} roots, max depth {}",
            roots.len(),
            walker.max_depth
        );
        roots
    }

    /// Department context for a focused position
    fn focus_context(&self, position_id: i64, requested: Option<i64>) -> Option<i64> {
        if let Some(department_id) = requested {
            let staffed = self.staffing.contains_key(&(position_id, department_id))
                || self.scoped_children.contains(&(position_id, department_id))
                || self.employees.contains_key(&(position_id, department_id));
            if staffed {
                return Some(department_id);
            }
        }
        self.links_by_position
            .get(&position_id)
            .and_then(|links| links.first())
            .map(|l| l.department_id)
    }

    /// Departments reachable from a top-level department, in discovery order
    pub fn reachable_departments(&self) -> Vec<i64> {
        let mut order: Vec<i64> = Vec::new();
        let mut seen: HashSet<i64> = HashSet::new();
        let mut queue: std::collections::VecDeque<i64> =
            self.top_level.iter().map(|d| d.department_id).collect();

        while let Some(department_id) = queue.pop_front() {
            if !seen.insert(department_id) {
                continue;
            }
            order.push(department_id);

            if let Some(children) = self.departments_by_parent_department.get(&department_id) {
                queue.extend(children.iter().map(|d| d.department_id));
            }
            // Departments hanging off positions staffed here
            let mut staffed: Vec<i64> = self
                .links_by_department
                .get(&department_id)
                .map(|links| links.iter().map(|l| l.position_id).collect())
                .unwrap_or_default();
            staffed.extend(
                self.scoped_children
                    .iter()
                    .filter(|(_, d)| *d == department_id)
                    .map(|(p, _)| *p),
            );
            staffed.sort_unstable();
            staffed.dedup();
            for position_id in staffed {
                if let Some(children) = self.departments_by_parent_position.get(&position_id) {
                    queue.extend(children.iter().map(|d| d.department_id));
                }
            }
        }
        order
    }

    /// Roots of the positions view: (position, department) pairs whose
    /// position never reports to another position
    fn root_positions(&self) -> Vec<(&'a position::Model, i64)> {
        let mut roots = Vec::new();
        for department_id in self.reachable_departments() {
            let Some(links) = self.links_by_department.get(&department_id) else {
                continue;
            };
            for link in links {
                if self.child_position_ids.contains(&link.position_id) {
                    continue;
                }
                if let Some(position) = self.positions.get(&link.position_id) {
                    roots.push((*position, department_id));
                }
            }
        }
        roots
    }
}

struct Walker<'b, 'a> {
    index: &'b HierarchyBuilder<'a>,
    max_depth: u32,
    view: ViewMode,
}

impl<'b, 'a> Walker<'b, 'a> {
    fn department_node(&self, dept: &department::Model, depth: u32) -> HierarchyNode {
        let children = if depth < self.max_depth {
            self.department_children(dept.department_id, depth + 1)
        } else {
            Vec::new()
        };
        HierarchyNode::Department(DepartmentNode {
            key: department_key(dept.department_id),
            depth,
            department: dept.clone(),
            children,
        })
    }

    fn department_children(&self, department_id: i64, depth: u32) -> Vec<HierarchyNode> {
        let index = self.index;
        let mut children = Vec::new();

        if let Some(links) = index.links_by_department.get(&department_id) {
            for link in links {
                // Positions reporting to another position here appear under that position
                if index.scoped_children.contains(&(link.position_id, department_id)) {
                    continue;
                }
                if let Some(position) = index.positions.get(&link.position_id) {
                    children.push(self.position_node(position, Some(department_id), depth));
                }
            }
        }
        if let Some(depts) = index.departments_by_parent_department.get(&department_id) {
            children.extend(depts.iter().map(|d| self.department_node(d, depth)));
        }
        children
    }

    fn position_node(
        &self,
        position: &position::Model,
        context: Option<i64>,
        depth: u32,
    ) -> HierarchyNode {
        let index = self.index;
        let position_id = position.position_id;

        let (employees, link) = match context {
            Some(department_id) => (
                index.employees.get(&(position_id, department_id)),
                index.staffing.get(&(position_id, department_id)).copied(),
            ),
            None => (index.employees_by_position.get(&position_id), None),
        };
        let employees: Vec<employee::Model> = employees
            .map(|list| list.iter().map(|e| (*e).clone()).collect())
            .unwrap_or_default();
        let staffing = Staffing::compute(employees.len(), link);

        let mut children = Vec::new();
        if depth < self.max_depth {
            if let Some(department_id) = context {
                if let Some(lines) = index.subordinates.get(&(position_id, department_id)) {
                    for line in lines {
                        if let Some(child) = index.positions.get(&line.position_id) {
                            children.push(self.position_node(child, Some(department_id), depth + 1));
                        }
                    }
                }
            }
            if self.view == ViewMode::Organization {
                if let Some(depts) = index.departments_by_parent_position.get(&position_id) {
                    children.extend(depts.iter().map(|d| self.department_node(d, depth + 1)));
                }
            }
        }

        HierarchyNode::Position(PositionNode {
            key: position_key(position_id, context),
            depth,
            position: position.clone(),
            department_context: context,
            employees,
            staffing,
            children,
        })
    }
}
