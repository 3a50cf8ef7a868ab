//! Hierarchy node types

use serde::{Deserialize, Serialize};
use std::fmt::Write;

use crate::entity::{department, employee, position, position_department};

/// Head count figures of a position within one department
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Staffing {
    /// Employees sitting in this (position, department) seat
    pub occupied: u32,
    pub vacancies: u32,
    /// Always `occupied + vacancies`
    pub total: u32,
    /// Budgeted units from the staffing link, if one exists
    pub staff_units: Option<i32>,
    pub vacant: bool,
}

impl Staffing {
    pub fn compute(occupied: usize, link: Option<&position_department::Model>) -> Self {
        let occupied = u32::try_from(occupied).unwrap_or(u32::MAX);
        let vacancies = link
            .map(|l| u32::try_from(l.vacancies).unwrap_or(0))
            .unwrap_or(0);
        Self {
            occupied,
            vacancies,
            total: occupied.saturating_add(vacancies),
            staff_units: link.map(|l| l.staff_units),
            vacant: occupied == 0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DepartmentNode {
    pub key: String,
    pub depth: u32,
    pub department: department::Model,
    pub children: Vec<HierarchyNode>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PositionNode {
    pub key: String,
    pub depth: u32,
    pub position: position::Model,
    /// Department whose staffing values apply to this occurrence
    pub department_context: Option<i64>,
    pub employees: Vec<employee::Model>,
    pub staffing: Staffing,
    pub children: Vec<HierarchyNode>,
}

/// One node of the organization forest
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HierarchyNode {
    Department(DepartmentNode),
    Position(PositionNode),
}

pub(crate) fn department_key(department_id: i64) -> String {
    format!("dept_{}", department_id)
}

pub(crate) fn position_key(position_id: i64, context: Option<i64>) -> String {
    match context {
        Some(department_id) => format!("pos_{}_{}", position_id, department_id),
        None => format!("pos_{}", position_id),
    }
}

impl HierarchyNode {
    pub fn key(&self) -> &str {
        match self {
            HierarchyNode::Department(n) => &n.key,
            HierarchyNode::Position(n) => &n.key,
        }
    }

    pub fn depth(&self) -> u32 {
        match self {
            HierarchyNode::Department(n) => n.depth,
            HierarchyNode::Position(n) => n.depth,
        }
    }

    pub fn children(&self) -> &[HierarchyNode] {
        match self {
            HierarchyNode::Department(n) => &n.children,
            HierarchyNode::Position(n) => &n.children,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            HierarchyNode::Department(n) => &n.department.name,
            HierarchyNode::Position(n) => &n.position.name,
        }
    }

    pub fn as_position(&self) -> Option<&PositionNode> {
        match self {
            HierarchyNode::Position(n) => Some(n),
            HierarchyNode::Department(_) => None,
        }
    }

    pub fn as_department(&self) -> Option<&DepartmentNode> {
        match self {
            HierarchyNode::Department(n) => Some(n),
            HierarchyNode::Position(_) => None,
        }
    }

    pub fn position_id(&self) -> Option<i64> {
        self.as_position().map(|n| n.position.position_id)
    }

    pub fn department_id(&self) -> Option<i64> {
        self.as_department().map(|n| n.department.department_id)
    }

    /// Pre-order walk over this node and all descendants
    pub fn walk(&self) -> Vec<&HierarchyNode> {
        let mut out = vec![self];
        for child in self.children() {
            out.extend(child.walk());
        }
        out
    }
}

/// Result of building from possibly incomplete input
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "nodes", rename_all = "snake_case")]
pub enum HierarchyView {
    /// At least one collection has not been loaded yet
    Loading,
    /// Nothing to show; the structure is not configured
    Empty,
    Ready(Vec<HierarchyNode>),
}

impl HierarchyView {
    pub fn from_nodes(nodes: Vec<HierarchyNode>) -> Self {
        if nodes.is_empty() {
            HierarchyView::Empty
        } else {
            HierarchyView::Ready(nodes)
        }
    }

    pub fn nodes(&self) -> &[HierarchyNode] {
        match self {
            HierarchyView::Ready(nodes) => nodes,
            _ => &[],
        }
    }
}

/// Indented plain-text outline of a forest, two spaces per level
pub fn render_outline(nodes: &[HierarchyNode]) -> String {
    let mut out = String::new();
    for node in nodes {
        render_node(&mut out, node, 0);
    }
    out
}

fn render_node(out: &mut String, node: &HierarchyNode, indent: usize) {
    let pad = "  ".repeat(indent);
    match node {
        HierarchyNode::Department(_) => {
            let _ = writeln!(out, "{}[D] {}", pad, node.name());
        }
        HierarchyNode::Position(n) => {
            let holders = if n.staffing.vacant {
                "vacant".to_string()
            } else {
                n.employees
                    .iter()
                    .map(|e| e.full_name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            };
            let _ = writeln!(
                out,
                "{}[P] {} ({}/{}) {}",
                pad,
                node.name(),
                n.staffing.occupied,
                n.staffing.total,
                holders
            );
        }
    }
    for child in node.children() {
        render_node(out, child, indent + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(vacancies: i32) -> position_department::Model {
        position_department::Model {
            id: 1,
            position_id: 1,
            department_id: 1,
            staff_units: 3,
            current_count: 0,
            vacancies,
            sort: 0,
            deleted: false,
        }
    }

    #[test]
    fn test_staffing_with_link() {
        let s = Staffing::compute(1, Some(&link(1)));
        assert_eq!(s.occupied, 1);
        assert_eq!(s.vacancies, 1);
        assert_eq!(s.total, 2);
        assert_eq!(s.staff_units, Some(3));
        assert!(!s.vacant);
    }

    #[test]
    fn test_staffing_without_link() {
        let s = Staffing::compute(2, None);
        assert_eq!(s.vacancies, 0);
        assert_eq!(s.total, 2);
        assert_eq!(s.staff_units, None);

        let empty = Staffing::compute(0, None);
        assert!(empty.vacant);
        assert_eq!(empty.total, 0);
    }

    #[test]
    fn test_negative_vacancies_count_as_zero() {
        let s = Staffing::compute(1, Some(&link(-4)));
        assert_eq!(s.vacancies, 0);
        assert_eq!(s.total, 1);
    }

    #[test]
    fn test_node_serializes_with_type_tag() {
        let node = HierarchyNode::Department(DepartmentNode {
            key: department_key(7),
            depth: 0,
            department: department::Model {
                department_id: 7,
                name: "Sales".to_string(),
                parent_department_id: None,
                parent_position_id: None,
                is_organization: false,
                logo_path: None,
                deleted: false,
            },
            children: vec![],
        });
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["type"], "department");
        assert_eq!(json["key"], "dept_7");

        let back: HierarchyNode = serde_json::from_value(json).unwrap();
        assert_eq!(back, node);
    }

    #[test]
    fn test_view_serialization() {
        let json = serde_json::to_value(HierarchyView::Loading).unwrap();
        assert_eq!(json["state"], "loading");
        assert_eq!(HierarchyView::from_nodes(vec![]), HierarchyView::Empty);
    }

    #[test]
    fn test_render_outline() {
        let node = HierarchyNode::Position(PositionNode {
            key: position_key(1, Some(1)),
            depth: 0,
            position: position::Model {
                position_id: 1,
                name: "Engineer".to_string(),
                deleted: false,
            },
            department_context: Some(1),
            employees: vec![],
            staffing: Staffing::compute(0, Some(&link(2))),
            children: vec![],
        });
        assert_eq!(render_outline(&[node]), "[P] Engineer (0/2) vacant\n");
    }
}
